use rand::RngCore;

/// A random 128-bit id, hex encoded.
pub fn new_trace_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Keeps a caller-supplied trace id verbatim, or generates one if it is blank.
pub fn ensure_trace_id(trace_id: &str) -> String {
    if trace_id.trim().is_empty() {
        new_trace_id()
    } else {
        trace_id.to_string()
    }
}
