// Error codes
// Stable identifiers surfaced to collaborators alongside error messages

pub mod intake {
    pub const MISSING_REQUIRED_FIELD: &str = "INTAKE_1001";
    pub const OUT_OF_RANGE: &str = "INTAKE_1002";
    pub const INVALID_FORMAT: &str = "INTAKE_1003";
}

pub mod config {
    pub const LOAD_FAILED: &str = "CONFIG_2001";
    pub const INVALID_VALUE: &str = "CONFIG_2002";
    pub const ARTIFACT_UNREADABLE: &str = "CONFIG_2003";
}

pub mod scoring {
    pub const SCORER_TIMEOUT: &str = "SCORING_3001";
    pub const SCORER_FAILED: &str = "SCORING_3002";
    pub const INVALID_PROBABILITY: &str = "SCORING_3003";
    pub const MALFORMED_FEATURES: &str = "SCORING_3004";
}

pub mod audit {
    pub const APPEND_FAILED: &str = "AUDIT_4001";
    pub const CHAIN_BROKEN: &str = "AUDIT_4002";
}

pub mod internal {
    pub const TASK_FAILED: &str = "INTERNAL_9001";
}
