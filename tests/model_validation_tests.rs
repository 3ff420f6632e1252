use clean_blog::models::{RegisterForm, is_valid_email, normalize_email};

fn base_form() -> RegisterForm {
    RegisterForm {
        username: "alice_99".to_string(),
        email: "alice@example.com".to_string(),
        password: "password123".to_string(),
        password2: "password123".to_string(),
    }
}

// --- Registration Rules ---

#[test]
fn test_valid_form_passes_with_normalized_fields() {
    let form = RegisterForm {
        username: "  alice_99  ".to_string(),
        email: " Alice@Example.COM ".to_string(),
        ..base_form()
    };

    let valid = form.validate().expect("form should validate");
    assert_eq!(valid.username, "alice_99");
    assert_eq!(valid.email, "alice@example.com");
    assert_eq!(valid.password, "password123");
}

#[test]
fn test_username_length_bounds() {
    let short = RegisterForm {
        username: "ab".to_string(),
        ..base_form()
    };
    let errors = short.validate().unwrap_err();
    assert!(errors.contains(&"Username must be between 3 and 20 characters".to_string()));

    let long = RegisterForm {
        username: "a".repeat(21),
        ..base_form()
    };
    let errors = long.validate().unwrap_err();
    assert!(errors.contains(&"Username must be between 3 and 20 characters".to_string()));

    // Both boundaries are inclusive.
    assert!(
        RegisterForm {
            username: "abc".to_string(),
            ..base_form()
        }
        .validate()
        .is_ok()
    );
    assert!(
        RegisterForm {
            username: "a".repeat(20),
            ..base_form()
        }
        .validate()
        .is_ok()
    );
}

#[test]
fn test_username_charset() {
    let form = RegisterForm {
        username: "alice-99!".to_string(),
        ..base_form()
    };
    let errors = form.validate().unwrap_err();
    assert!(
        errors.contains(&"Username can only contain letters, numbers, and underscores".to_string())
    );

    assert!(
        RegisterForm {
            username: "Alice_99".to_string(),
            ..base_form()
        }
        .validate()
        .is_ok()
    );
}

#[test]
fn test_password_rules() {
    let short = RegisterForm {
        password: "12345".to_string(),
        password2: "12345".to_string(),
        ..base_form()
    };
    let errors = short.validate().unwrap_err();
    assert!(errors.contains(&"Password must be at least 6 characters long".to_string()));

    let mismatch = RegisterForm {
        password2: "password124".to_string(),
        ..base_form()
    };
    let errors = mismatch.validate().unwrap_err();
    assert_eq!(errors, vec!["Passwords do not match".to_string()]);
}

#[test]
fn test_all_violations_are_aggregated() {
    // Violates every rule at once; every message must come back.
    let form = RegisterForm {
        username: "a!".to_string(),
        email: "nope".to_string(),
        password: "123".to_string(),
        password2: "456".to_string(),
    };

    let errors = form.validate().unwrap_err();
    assert_eq!(errors.len(), 5);
    assert_eq!(errors[0], "Username must be between 3 and 20 characters");
    assert_eq!(errors[4], "Passwords do not match");
}

#[test]
fn test_missing_fields_fail_validation() {
    // A blank submission fails validation instead of erroring out.
    let errors = RegisterForm::default().validate().unwrap_err();
    assert!(!errors.is_empty());
}

// --- Email Helpers ---

#[test]
fn test_normalize_email() {
    assert_eq!(normalize_email("  Alice@Example.COM  "), "alice@example.com");
    assert_eq!(normalize_email("bob@host.org"), "bob@host.org");
}

#[test]
fn test_is_valid_email() {
    assert!(is_valid_email("alice@example.com"));
    assert!(is_valid_email("a.b+c@sub.example.co"));

    assert!(!is_valid_email(""));
    assert!(!is_valid_email("plainaddress"));
    assert!(!is_valid_email("@example.com"));
    assert!(!is_valid_email("alice@"));
    assert!(!is_valid_email("alice@nodot"));
    assert!(!is_valid_email("alice@.com"));
    assert!(!is_valid_email("alice@example.com."));
    assert!(!is_valid_email("a@b@c.com"));
    assert!(!is_valid_email("alice @example.com"));
}
