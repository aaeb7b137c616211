/// Escape LIKE metacharacters so user input matches literally.
///
/// Used together with `ESCAPE '\'` on the LIKE expression.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
