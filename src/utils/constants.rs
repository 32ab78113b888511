pub const FAITH_DEFAULT_MS: u64 = 3000;
pub const PATIENCE_DEFAULT_MS: u64 = 400;
pub const DEFAULT_ATTEMPTS: u32 = 3;

pub const ENV_FAITH_MS: &str = "SERIAL_WORKER_FAITH_MS";
pub const ENV_PATIENCE_MS: &str = "SERIAL_WORKER_PATIENCE_MS";
pub const ENV_ATTEMPTS: &str = "SERIAL_WORKER_ATTEMPTS";

pub const UNTITLED_JOB: &str = "<untitled>";
