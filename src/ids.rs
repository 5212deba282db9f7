use uuid::Uuid;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Short opaque record id: 7 base-36 characters drawn from fresh UUID bytes.
/// Uniqueness is probabilistic and never checked against existing records.
pub fn new_id() -> String {
    let bytes = *Uuid::new_v4().as_bytes();
    bytes[..7]
        .iter()
        .map(|b| BASE36[(*b as usize) % BASE36.len()] as char)
        .collect()
}
