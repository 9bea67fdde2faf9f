//! Resource naming

/// Derive a GCP resource name from a hostname.
///
/// Anything other than an ASCII letter, digit or `-` becomes `-`, and the
/// result is lowercased. The static address, the instance and the tunnel all
/// share this name.
pub fn normalize_hostname(hostname: &str) -> String {
    hostname
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dots_become_hyphens() {
        assert_eq!(normalize_hostname("n8n.example.com"), "n8n-example-com");
    }

    #[test]
    fn test_dot_free_name_is_unchanged() {
        assert_eq!(normalize_hostname("localhost"), "localhost");
        assert_eq!(normalize_hostname("n8n-prod"), "n8n-prod");
    }

    #[test]
    fn test_other_separators_and_case() {
        assert_eq!(normalize_hostname("N8N_Box.Example.com"), "n8n-box-example-com");
    }
}
