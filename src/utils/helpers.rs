//! General utility helper functions

use rand::Rng;

const PASSWORD_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const PASSWORD_LENGTH: usize = 20;

/// Generate a random service password of lowercase letters and digits
pub fn generate_random_password() -> String {
    let mut rng = rand::thread_rng();
    (0..PASSWORD_LENGTH)
        .map(|_| PASSWORD_CHARSET[rng.gen_range(0..PASSWORD_CHARSET.len())] as char)
        .collect()
}

/// Hide all but the first two characters of a secret value
pub fn mask_value(value: &str) -> String {
    if value.chars().count() <= 4 {
        return "*".repeat(8);
    }
    let visible: String = value.chars().take(2).collect();
    format!("{}{}", visible, "*".repeat(8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_random_password() {
        let first = generate_random_password();
        let second = generate_random_password();

        assert_eq!(first.len(), PASSWORD_LENGTH);
        assert!(first
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_mask_value() {
        assert_eq!(mask_value("abc"), "********");
        assert_eq!(mask_value("ghp_1234567890"), "gh********");
    }
}
