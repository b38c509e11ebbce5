//! Contact form message model.

use serde::{Deserialize, Serialize};

/// A message submitted through the public contact form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactMessage {
    pub const TABLE: &'static str = "contact_messages";

    /// Trimmed copy, or `None` when any field is blank.
    pub fn normalized(&self) -> Option<Self> {
        let name = self.name.trim();
        let email = self.email.trim();
        let message = self.message.trim();
        if name.is_empty() || email.is_empty() || message.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_trims_fields() {
        let msg = ContactMessage {
            name: "  Meera ".to_string(),
            email: " meera@example.com".to_string(),
            message: "Do you ship abroad?\n".to_string(),
        };
        let normalized = msg.normalized().unwrap();
        assert_eq!(normalized.name, "Meera");
        assert_eq!(normalized.email, "meera@example.com");
        assert_eq!(normalized.message, "Do you ship abroad?");
    }

    #[test]
    fn test_normalized_rejects_blank_field() {
        let msg = ContactMessage {
            name: "Meera".to_string(),
            email: "   ".to_string(),
            message: "Hello".to_string(),
        };
        assert!(msg.normalized().is_none());
    }
}
