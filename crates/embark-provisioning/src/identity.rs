//! Identity derivation.
//!
//! Computes the canonical identity attributes for a person from dirty HR
//! source data: username, email address, initials, and the one-time
//! initial password. All rules are deterministic except the password,
//! which is freshly generated from the OS CSPRNG on every invocation.

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

use embark_hr::PersonRecord;

/// Length of the generated initial password.
const PASSWORD_LEN: usize = 12;

/// Maximum characters taken from the cleaned last name.
const LAST_NAME_PREFIX_LEN: usize = 5;

/// Characters taken from the end of the employee ID.
const ID_SUFFIX_LEN: usize = 2;

/// Password alphabet: the 62 alphanumeric symbols.
const PASSWORD_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Errors that can occur during identity derivation. All are fatal to the
/// run — a record that cannot produce a username must not be provisioned.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// A name component is empty after stripping non-alphabetic characters.
    #[error("cleaned {field} is empty for employee {employee_id}")]
    EmptyName {
        field: &'static str,
        employee_id: String,
    },

    /// The OS random source failed.
    ///
    /// The system refuses to provision with a predictable or empty
    /// password.
    #[error("random source failure: {message}")]
    RandomSource { message: String },
}

/// Attributes computed from a person record.
///
/// Never persisted independently; the directory GUID only exists after
/// account creation and lives on the provisioning outcome instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedIdentity {
    /// Directory account name.
    pub username: String,

    /// Mail address.
    pub email: String,

    /// 1–3 character initials.
    pub initials: String,

    /// One-time initial password. Fresh per invocation — regenerating for
    /// an already-provisioned account would desynchronize credentials,
    /// which is why derivation only runs for uncached people.
    pub initial_password: String,
}

/// Derives identity attributes for the fixed organizational mail domain.
#[derive(Debug, Clone)]
pub struct IdentityDeriver {
    /// Organizational mail domain (no leading `@`).
    domain: String,
}

impl IdentityDeriver {
    /// Create a deriver for the given mail domain.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    /// Derive all identity attributes for a person.
    pub fn derive(&self, person: &PersonRecord) -> Result<DerivedIdentity, IdentityError> {
        let username = derive_username(
            &person.first_name,
            &person.last_name,
            person.employee_id.as_str(),
        )
        .ok_or_else(|| IdentityError::EmptyName {
            field: "name",
            employee_id: person.employee_id.to_string(),
        })?;

        let email = self.derive_email(
            person.contact_email.as_deref(),
            &person.mailstop,
            &username,
        );

        let initials = derive_initials(
            &person.first_name,
            person.middle_name.as_deref(),
            &person.last_name,
        );

        let initial_password = generate_password()?;

        Ok(DerivedIdentity {
            username,
            email,
            initials,
            initial_password,
        })
    }

    /// Derive the mail address.
    ///
    /// Local part: text before `@` in the contact field; falls back to the
    /// mailstop identifier when the contact field is empty, and to the
    /// derived username when the mailstop is empty too.
    fn derive_email(&self, contact: Option<&str>, mailstop: &str, username: &str) -> String {
        let contact = contact.map(str::trim).filter(|c| !c.is_empty());

        let local = match contact {
            Some(c) => c.split('@').next().unwrap_or(c),
            None if !mailstop.trim().is_empty() => mailstop.trim(),
            None => username,
        };

        format!("{}@{}", local, self.domain)
    }
}

/// Strip everything that is not an alphabetic character.
fn strip_non_alphabetic(value: &str) -> String {
    value.chars().filter(|c| c.is_alphabetic()).collect()
}

/// Derive the username: first initial + up to five characters of the
/// cleaned last name + last two characters of the employee ID, with no
/// separators.
///
/// Deterministic but not collision-free across the population; two people
/// whose names and ID suffixes coincide map to the same username. That is
/// accepted input risk, surfaced later as a directory create conflict.
///
/// Returns `None` when either cleaned name is empty.
fn derive_username(first_name: &str, last_name: &str, employee_id: &str) -> Option<String> {
    let first = strip_non_alphabetic(first_name);
    let last = strip_non_alphabetic(last_name);

    let first_char = first.chars().next()?;
    if last.is_empty() {
        return None;
    }

    let last_prefix: String = last.chars().take(LAST_NAME_PREFIX_LEN).collect();

    let id_chars = employee_id.chars().count();
    let suffix: String = employee_id
        .chars()
        .skip(id_chars.saturating_sub(ID_SUFFIX_LEN))
        .collect();

    Some(format!("{first_char}{last_prefix}{suffix}"))
}

/// Derive initials: first character of each present name component,
/// concatenated. Between one and three characters.
fn derive_initials(first_name: &str, middle_name: Option<&str>, last_name: &str) -> String {
    let mut initials = String::new();

    if let Some(c) = first_name.trim().chars().next() {
        initials.push(c);
    }
    if let Some(c) = middle_name.and_then(|m| m.trim().chars().next()) {
        initials.push(c);
    }
    if let Some(c) = last_name.trim().chars().next() {
        initials.push(c);
    }

    initials
}

/// Generate a 12-character password drawn uniformly from the alphanumeric
/// alphabet, using the OS CSPRNG.
fn generate_password() -> Result<String, IdentityError> {
    let mut password = String::with_capacity(PASSWORD_LEN);
    let mut buf = [0u8; 64];

    while password.len() < PASSWORD_LEN {
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(|e| IdentityError::RandomSource {
                message: e.to_string(),
            })?;

        for &byte in &buf {
            // Reject the tail of the byte range so every symbol stays
            // equally likely (248 = 4 * 62)
            if byte < 248 {
                password.push(PASSWORD_ALPHABET[(byte % 62) as usize] as char);
                if password.len() == PASSWORD_LEN {
                    break;
                }
            }
        }
    }

    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use embark_core::EmployeeId;
    use embark_hr::EmploymentStatus;

    fn person() -> PersonRecord {
        PersonRecord {
            employee_id: EmployeeId::new("12345"),
            first_name: "Mary-Ann".to_string(),
            middle_name: None,
            last_name: "O'Brien".to_string(),
            job_title: "Nurse".to_string(),
            department: "ICU".to_string(),
            division: "Inpatient".to_string(),
            mailstop: String::new(),
            supervisor_id: None,
            status: EmploymentStatus::Active,
            contact_email: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_username_strips_non_alphabetic() {
        // Hyphen and apostrophe are stripped before segmenting
        let username = derive_username("Mary-Ann", "O'Brien", "12345").unwrap();
        assert_eq!(username, "MOBrie45");
        assert!(username.chars().all(char::is_alphanumeric));
    }

    #[test]
    fn test_username_short_last_name_used_whole() {
        let username = derive_username("Jane", "Oh", "98765").unwrap();
        assert_eq!(username, "JOh65");
    }

    #[test]
    fn test_username_last_name_exactly_five() {
        let username = derive_username("Jane", "Smith", "98765").unwrap();
        assert_eq!(username, "JSmith65");
    }

    #[test]
    fn test_username_long_last_name_truncated() {
        let username = derive_username("Jane", "Abernathy", "98765").unwrap();
        assert_eq!(username, "JAbern65");
    }

    #[test]
    fn test_username_id_suffix_is_final_two_chars() {
        for id in ["7", "42", "12345", "A-99"] {
            let username = derive_username("Jane", "Smith", id).unwrap();
            let expected_suffix: String = id
                .chars()
                .skip(id.chars().count().saturating_sub(2))
                .collect();
            assert!(username.ends_with(&expected_suffix), "{username} / {id}");
        }
    }

    #[test]
    fn test_username_empty_cleaned_name_rejected() {
        assert!(derive_username("123", "Smith", "12345").is_none());
        assert!(derive_username("Jane", "...", "12345").is_none());
    }

    #[test]
    fn test_initials_without_middle_name() {
        assert_eq!(derive_initials("Mary-Ann", None, "O'Brien"), "MO");
    }

    #[test]
    fn test_initials_with_middle_name() {
        assert_eq!(derive_initials("John", Some("Quincy"), "Adams"), "JQA");
    }

    #[test]
    fn test_initials_minimum_one_char() {
        assert_eq!(derive_initials("Cher", None, ""), "C");
    }

    #[test]
    fn test_email_prefers_contact_local_part() {
        let deriver = IdentityDeriver::new("corp.example.org");
        let email = deriver.derive_email(Some("mob@oldmail.example.net"), "MS-204", "MOBrie45");
        assert_eq!(email, "mob@corp.example.org");
    }

    #[test]
    fn test_email_falls_back_to_mailstop() {
        let deriver = IdentityDeriver::new("corp.example.org");
        let email = deriver.derive_email(None, "MS-204", "MOBrie45");
        assert_eq!(email, "MS-204@corp.example.org");
    }

    #[test]
    fn test_email_falls_back_to_username_last() {
        let deriver = IdentityDeriver::new("corp.example.org");
        let email = deriver.derive_email(None, "  ", "MOBrie45");
        assert_eq!(email, "MOBrie45@corp.example.org");
    }

    #[test]
    fn test_password_length_and_alphabet() {
        let password = generate_password().unwrap();
        assert_eq!(password.len(), 12);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_password_fresh_each_invocation() {
        // Two 62^12 draws colliding means the RNG is broken
        assert_ne!(generate_password().unwrap(), generate_password().unwrap());
    }

    #[test]
    fn test_derive_full_identity() {
        let deriver = IdentityDeriver::new("corp.example.org");
        let identity = deriver.derive(&person()).unwrap();

        assert_eq!(identity.username, "MOBrie45");
        assert_eq!(identity.email, "MOBrie45@corp.example.org");
        assert_eq!(identity.initials, "MO");
        assert_eq!(identity.initial_password.len(), 12);
    }

    #[test]
    fn test_derive_rejects_unusable_name() {
        let deriver = IdentityDeriver::new("corp.example.org");
        let mut bad = person();
        bad.first_name = "123".to_string();
        assert!(deriver.derive(&bad).is_err());
    }
}
