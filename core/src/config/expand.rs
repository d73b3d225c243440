//! Placeholder expansion for configuration values.

/// Replace every `${env:NAME}` placeholder with the value of the environment
/// variable `NAME`.
///
/// Unset variables expand to the empty string. An unterminated placeholder
/// is kept verbatim.
pub fn expand_env_placeholders(input: &str) -> String {
    const OPEN: &str = "${env:";

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                out.push_str(&std::env::var(name).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
