//! Integration tests for the request classifier
//!
//! Realistic help-desk requests through the built-in rule tables.

use triage::{Category, ClassificationResult, Classifier, NoMatchPolicy};

fn assert_category(classifier: &Classifier, text: &str, expected: Category, min_confidence: f64) {
    let result = classifier.classify(text);
    assert_eq!(result.category, expected, "wrong category for {:?}: {:?}", text, result);
    assert!(
        result.confidence > min_confidence,
        "confidence {} too low for {:?}",
        result.confidence,
        text
    );
}

#[test]
fn test_password_reset_requests() {
    let classifier = Classifier::new();
    for text in [
        "I forgot my password and can't log into my computer",
        "Reset my login credentials please for my work account",
        "Account locked out, need help with computer access",
    ] {
        assert_category(&classifier, text, Category::PasswordReset, 0.5);
    }
}

#[test]
fn test_software_installation_requests() {
    let classifier = Classifier::new();
    for text in [
        "I need to install new software on my laptop",
        "How do I setup this application on my computer?",
        "Installation error when downloading program for work",
    ] {
        assert_category(&classifier, text, Category::SoftwareInstallation, 0.5);
    }
}

#[test]
fn test_hardware_failure_requests() {
    let classifier = Classifier::new();
    for text in [
        "My work laptop screen is flickering and won't display properly",
        "Office computer won't turn on this morning",
        "Work keyboard stopped working suddenly on my computer",
    ] {
        assert_category(&classifier, text, Category::HardwareFailure, 0.5);
    }
}

#[test]
fn test_network_connectivity_requests() {
    let classifier = Classifier::new();
    for text in [
        "Can't connect to office WiFi network",
        "Internet connection keeps dropping on my work computer",
        "VPN not working from home office",
    ] {
        assert_category(&classifier, text, Category::NetworkConnectivity, 0.5);
    }
}

#[test]
fn test_email_security_and_policy_requests() {
    let classifier = Classifier::new();
    assert_category(
        &classifier,
        "My work email is not syncing with Outlook",
        Category::EmailConfiguration,
        0.7,
    );
    assert_category(
        &classifier,
        "I received a suspicious email at work asking for my credentials",
        Category::SecurityIncident,
        0.7,
    );
    assert_category(
        &classifier,
        "What's the policy for installing software on work computers?",
        Category::PolicyQuestion,
        0.7,
    );
}

#[test]
fn test_off_topic_requests_filtered() {
    let classifier = Classifier::new();
    for text in [
        "Where can I find the cafeteria menu?",
        "What time does the cafeteria open?",
        "What would happen if I spilled coffee on my laptop?",
        "Where is the parking garage located?",
        "When is the next company meeting?",
    ] {
        let result = classifier.classify(text);
        assert_eq!(result.category, Category::NonIt, "{:?}", text);
        assert_eq!(result.confidence, 0.0);
        assert!(result.matched_terms.is_empty());
    }
}

#[test]
fn test_off_topic_wins_over_it_keywords() {
    // "coffee" + "lunch" outweigh the password keywords
    let result = Classifier::new()
        .classify("I forgot my password at lunch and spilled coffee on my work computer");
    assert_eq!(result.category, Category::NonIt);
    assert_eq!(result.confidence, 0.0);
}

#[test]
fn test_confidence_bands() {
    let classifier = Classifier::new();

    let high = classifier.classify("I forgot my password and can't log into my work computer account");
    assert!(high.confidence > 0.7);

    let medium = classifier.classify("need password help for my computer login");
    assert!(medium.confidence > 0.3);
    assert!(medium.confidence < 0.7);
}

#[test]
fn test_pattern_matches_boost_confidence() {
    let classifier = Classifier::new();
    for text in [
        "can't log in to work system",
        "unable to login to my computer today",
        "login problem with office computer",
    ] {
        let result = classifier.classify(text);
        assert_eq!(result.category, Category::PasswordReset);
        assert!(result.confidence > 0.6);
        assert!(result.matched_terms.iter().any(|t| t.starts_with("pattern:")));
    }
}

#[test]
fn test_matched_terms_order() {
    let result = Classifier::new().classify("I need to reset my password for computer login");
    assert_eq!(
        result.matched_terms,
        vec!["password", "login", "reset", "pattern:reset.*password"]
    );
    assert_eq!(result.reasoning, "matched 6 indicators for password_reset");
}

#[test]
fn test_missing_context_yields_no_match_sentinel() {
    let text = "password for my gym membership";
    assert_eq!(Classifier::new().classify(text).category, Category::NonIt);
    assert_eq!(
        Classifier::new()
            .with_no_match(NoMatchPolicy::Unknown)
            .classify(text)
            .category,
        Category::Unknown
    );
}

#[test]
fn test_vague_request_under_unknown_policy() {
    let classifier = Classifier::new().with_no_match(NoMatchPolicy::Unknown);
    let result = classifier.classify("Something is wrong with my system but I don't know what");
    assert_eq!(result.category, Category::Unknown);
    assert!(result.confidence < 0.5);
}

#[test]
fn test_shared_across_threads() {
    let classifier = std::sync::Arc::new(Classifier::new());
    let text = "Can't connect to office WiFi network";
    let expected = classifier.classify(text);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let classifier = classifier.clone();
            std::thread::spawn(move || classifier.classify(text))
        })
        .collect();

    for handle in handles {
        let result: ClassificationResult = handle.join().unwrap();
        assert_eq!(result, expected);
    }
}
