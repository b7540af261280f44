//! ID prefixes for generated entity ids (`<prefix>-<8 hex>`).

pub const PREFIX_CHECKLIST: &str = "chk";
pub const PREFIX_ANSWER: &str = "ans";
pub const PREFIX_PHOTO: &str = "pho";
pub const PREFIX_APPROVAL: &str = "apr";
pub const PREFIX_REJECTION: &str = "rej";
pub const PREFIX_EQUIPMENT: &str = "eqp";

pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_CHECKLIST,
    PREFIX_ANSWER,
    PREFIX_PHOTO,
    PREFIX_APPROVAL,
    PREFIX_REJECTION,
    PREFIX_EQUIPMENT,
];
