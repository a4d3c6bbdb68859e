/// Replace `${ENV_VAR}` placeholders in raw config text, resolving names
/// through `lookup`.
///
/// Unresolvable variables are left as-is so validation can point at them.
pub(crate) fn substitute_env(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) if end > 0 => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => result.push_str(&value),
                    None => {
                        result.push_str("${");
                        result.push_str(name);
                        result.push('}');
                    },
                }
                rest = &after[end + 1..];
            },
            _ => {
                // Unterminated or empty placeholder, keep literally.
                result.push_str("${");
                rest = after;
            },
        }
    }

    result.push_str(rest);
    result
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "VOUCHBOT_TEST_PASSWORD" => Some("hunter2".to_string()),
            _ => None,
        }
    }

    #[test]
    fn substitutes_known_var() {
        assert_eq!(
            substitute_env("password = \"${VOUCHBOT_TEST_PASSWORD}\"", lookup),
            "password = \"hunter2\""
        );
    }

    #[test]
    fn leaves_unknown_var() {
        assert_eq!(
            substitute_env("${VOUCHBOT_NOT_SET}", lookup),
            "${VOUCHBOT_NOT_SET}"
        );
    }

    #[test]
    fn keeps_malformed_placeholders() {
        assert_eq!(substitute_env("a ${ b", lookup), "a ${ b");
        assert_eq!(substitute_env("${}", lookup), "${}");
    }

    #[test]
    fn no_placeholders() {
        assert_eq!(substitute_env("plain text", lookup), "plain text");
    }
}
