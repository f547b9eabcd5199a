//! Form validation for the contact and waitlist forms.
//!
//! Both the server route and any client-side pre-check use these so the
//! field errors match.

use crate::error::FieldError;
use crate::models::{ContactRequest, WaitlistRequest};

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 100;
pub const MESSAGE_MIN_CHARS: usize = 10;
pub const MESSAGE_MAX_CHARS: usize = 5000;
pub const SUBJECT_MAX_CHARS: usize = 200;
pub const PHONE_MAX_CHARS: usize = 30;

/// Loose structural check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    let len = name.trim().chars().count();
    if len < NAME_MIN_CHARS {
        errors.push(FieldError::new(
            "name",
            format!("Name must be at least {NAME_MIN_CHARS} characters"),
        ));
    } else if len > NAME_MAX_CHARS {
        errors.push(FieldError::new(
            "name",
            format!("Name must be at most {NAME_MAX_CHARS} characters"),
        ));
    }
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Please enter a valid email address"));
    }
}

fn check_phone(phone: Option<&str>, errors: &mut Vec<FieldError>) {
    let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) else {
        return;
    };
    let valid_chars = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    if !valid_chars || phone.chars().count() > PHONE_MAX_CHARS {
        errors.push(FieldError::new("phone", "Please enter a valid phone number"));
    }
}

/// Validate a contact form submission. An empty vector means valid.
pub fn validate_contact(req: &ContactRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_name(&req.name, &mut errors);
    check_email(&req.email, &mut errors);
    check_phone(req.phone.as_deref(), &mut errors);

    if let Some(subject) = &req.subject {
        if subject.trim().chars().count() > SUBJECT_MAX_CHARS {
            errors.push(FieldError::new(
                "subject",
                format!("Subject must be at most {SUBJECT_MAX_CHARS} characters"),
            ));
        }
    }

    let message_len = req.message.trim().chars().count();
    if message_len < MESSAGE_MIN_CHARS {
        errors.push(FieldError::new(
            "message",
            format!("Message must be at least {MESSAGE_MIN_CHARS} characters"),
        ));
    } else if message_len > MESSAGE_MAX_CHARS {
        errors.push(FieldError::new(
            "message",
            format!("Message must be at most {MESSAGE_MAX_CHARS} characters"),
        ));
    }

    errors
}

/// Validate a course waitlist signup. An empty vector means valid.
pub fn validate_waitlist(req: &WaitlistRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    check_name(&req.name, &mut errors);
    check_email(&req.email, &mut errors);
    check_phone(req.phone.as_deref(), &mut errors);

    if req.course_id.trim().is_empty() {
        errors.push(FieldError::new("courseId", "Please choose a course"));
    }

    errors
}
