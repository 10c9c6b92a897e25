/// Backend record ids are opaque strings (e.g. `"a0B5g000001XyZ"`).
pub type RecordId = String;

/// Time of day encoded as `hour * 100 + minute` (see [`crate::hhmm`]).
pub type Hhmm = i32;
