//! AD-specific encoding helpers.
//!
//! Active Directory sets passwords through the `unicodePwd` attribute with
//! a dedicated encoding:
//! 1. Surround the password with double quotes: `"password"`
//! 2. Encode the quoted string as UTF-16LE bytes
//!
//! AD rejects `unicodePwd` writes over unencrypted connections, so LDAPS is
//! validated before any password-bearing operation.

use crate::error::{DirectoryError, DirectoryResult};

/// userAccountControl: normal account.
pub const UAC_NORMAL_ACCOUNT: u32 = 0x200;

/// userAccountControl: account disabled.
pub const UAC_ACCOUNTDISABLE: u32 = 0x2;

/// Encode a plaintext password for AD's unicodePwd attribute.
///
/// # Errors
/// Returns an error if the password is empty — an account must never be
/// created with a blank credential.
pub fn encode_ad_password(password: &str) -> DirectoryResult<Vec<u8>> {
    if password.is_empty() {
        return Err(DirectoryError::invalid_configuration(
            "password cannot be empty",
        ));
    }

    let quoted = format!("\"{password}\"");
    let encoded: Vec<u8> = quoted.encode_utf16().flat_map(u16::to_le_bytes).collect();

    Ok(encoded)
}

/// Validate that the connection is suitable for password operations.
///
/// AD requires LDAPS for any unicodePwd modification.
pub fn validate_password_connection(use_ssl: bool) -> DirectoryResult<()> {
    if !use_ssl {
        return Err(DirectoryError::invalid_configuration(
            "LDAPS (SSL) connection required for password operations; \
             AD rejects unicodePwd modifications over non-encrypted connections",
        ));
    }
    Ok(())
}

/// Compute the userAccountControl value for a new AD user.
#[must_use]
pub fn new_account_uac(disabled: bool) -> u32 {
    let mut uac = UAC_NORMAL_ACCOUNT;
    if disabled {
        uac |= UAC_ACCOUNTDISABLE;
    }
    uac
}

/// Build the Distinguished Name for a new user in the target OU.
///
/// Constructs `CN=<display_name>,<target_ou>` with RFC 4514 escaping on
/// the CN value.
pub fn build_user_dn(display_name: &str, target_ou: &str) -> DirectoryResult<String> {
    if display_name.is_empty() {
        return Err(DirectoryError::invalid_configuration(
            "display name cannot be empty for DN construction",
        ));
    }
    if target_ou.is_empty() {
        return Err(DirectoryError::invalid_configuration(
            "target OU cannot be empty for DN construction",
        ));
    }

    Ok(format!("CN={},{}", escape_dn_value(display_name), target_ou))
}

/// Escape special characters in a DN attribute value per RFC 4514.
#[must_use]
pub fn escape_dn_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        match c {
            '"' | '+' | ',' | ';' | '<' | '>' | '\\' => {
                result.push('\\');
                result.push(c);
            }
            '#' if i == 0 => {
                result.push('\\');
                result.push(c);
            }
            ' ' if i == 0 || i == value.chars().count() - 1 => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

/// Escape special characters in LDAP filter values (RFC 4515).
#[must_use]
pub fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_ad_password_basic() {
        let encoded = encode_ad_password("Test123!").unwrap();
        let expected: Vec<u8> = "\"Test123!\""
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_encode_ad_password_quote_framing() {
        let encoded = encode_ad_password("P@ssw0rd").unwrap();
        // '"' in UTF-16LE is 0x22 0x00 at both ends
        assert_eq!(&encoded[..2], &[0x22, 0x00]);
        assert_eq!(&encoded[encoded.len() - 2..], &[0x22, 0x00]);
    }

    #[test]
    fn test_encode_ad_password_empty_rejected() {
        assert!(encode_ad_password("").is_err());
    }

    #[test]
    fn test_encode_ad_password_length() {
        // "abc" -> 5 chars with quotes -> 10 UTF-16LE bytes
        assert_eq!(encode_ad_password("abc").unwrap().len(), 10);
    }

    #[test]
    fn test_validate_password_connection() {
        assert!(validate_password_connection(true).is_ok());
        assert!(validate_password_connection(false).is_err());
    }

    #[test]
    fn test_new_account_uac() {
        assert_eq!(new_account_uac(false), 0x200);
        assert_eq!(new_account_uac(true), 0x202);
    }

    #[test]
    fn test_build_user_dn() {
        let dn = build_user_dn("Mary-Ann O'Brien", "OU=ICU,OU=Staff,DC=x").unwrap();
        assert_eq!(dn, "CN=Mary-Ann O'Brien,OU=ICU,OU=Staff,DC=x");
    }

    #[test]
    fn test_build_user_dn_escapes_comma() {
        let dn = build_user_dn("Doe, John", "OU=Staff,DC=x").unwrap();
        assert_eq!(dn, "CN=Doe\\, John,OU=Staff,DC=x");
    }

    #[test]
    fn test_build_user_dn_rejects_empty() {
        assert!(build_user_dn("", "OU=Staff,DC=x").is_err());
        assert!(build_user_dn("John", "").is_err());
    }

    #[test]
    fn test_escape_dn_value_edges() {
        assert_eq!(escape_dn_value("John Doe"), "John Doe");
        assert_eq!(escape_dn_value("#admin"), "\\#admin");
        assert_eq!(escape_dn_value(" lead"), "\\ lead");
        assert_eq!(escape_dn_value("lead "), "lead\\ ");
        assert_eq!(escape_dn_value("O\"Brien"), "O\\\"Brien");
    }

    #[test]
    fn test_escape_filter_value() {
        assert_eq!(escape_filter_value("a*b"), "a\\2ab");
        assert_eq!(escape_filter_value("(x)"), "\\28x\\29");
        assert_eq!(escape_filter_value("a\\b"), "a\\5cb");
    }
}
