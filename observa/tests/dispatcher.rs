//! Tests for explicit validation, error namespaces and registration checks.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use observa::prelude::*;
use observa::rule::{MaxLength, Numeric, Range, Required};
use observa::{AnyRule, ErrorNamespace, ErrorsChanged, WILDCARD};

#[derive(Debug, Clone, Default)]
struct Profile {
    name: String,
    nickname: String,
    age: u32,
    amount: String,
}

impl Model for Profile {
    fn schema() -> observa::Result<Schema<Self>> {
        Schema::builder()
            .constrained("Name", |p: &Profile| &p.name, [Constraint::required()])
            .property("Nickname", |p: &Profile| &p.nickname)
            .property("Age", |p: &Profile| &p.age)
            .property("Amount", |p: &Profile| &p.amount)
            .build()
    }

    fn register_rules(rules: &mut Rules<'_, Self>) -> observa::Result<()> {
        rules.register::<u32, _>("Age", Arc::new(Range::new(18u32, 130u32)))?;
        rules.register::<String, _>("Amount", Arc::new(Numeric::new("Not a number")))?;
        Ok(())
    }

    fn config() -> ValidationConfig {
        ValidationConfig::new().manual()
    }
}

fn valid_profile() -> Profile {
    Profile {
        name: "Ada".to_string(),
        nickname: "ada".to_string(),
        age: 36,
        amount: "12.5".to_string(),
    }
}

fn observe(profile: Profile) -> Observable<Profile> {
    Observable::with_config(profile, ValidationConfig::new().culture(Culture::new("en-US")))
        .unwrap()
}

fn texts(errors: Vec<ErrorPayload>) -> Vec<String> {
    errors.into_iter().map(|e| e.text().to_string()).collect()
}

#[test]
fn test_validate_single_property_uses_user_namespace() {
    let mut profile = observe(Profile {
        age: 7,
        ..valid_profile()
    });

    assert!(!profile.validate(Some("Age")).unwrap());
    let store = profile.error_store();
    assert_eq!(store.namespace_errors("Age", ErrorNamespace::User).len(), 1);
    assert!(store.namespace_errors("Age", ErrorNamespace::Internal).is_empty());
    assert_eq!(
        texts(profile.errors(Some("Age"))),
        vec!["Value must be between 18 and 130."]
    );
}

#[test]
fn test_validate_is_idempotent() {
    let mut profile = observe(Profile {
        age: 7,
        ..valid_profile()
    });

    profile.validate(Some("Age")).unwrap();
    let first = profile.errors(Some("Age"));
    profile.validate(Some("Age")).unwrap();
    assert_eq!(profile.errors(Some("Age")), first);
    assert_eq!(first.len(), 1);
}

#[test]
fn test_wildcard_validation_folds_every_property() {
    let mut profile = observe(valid_profile());
    assert!(profile.validate(None).unwrap());
    assert!(!profile.has_errors());

    let mut profile = observe(Profile {
        name: " ".to_string(),
        amount: "abc".to_string(),
        ..valid_profile()
    });
    assert!(!profile.validate(Some("")).unwrap());
    assert!(profile.property_has_errors("Name"));
    assert!(profile.property_has_errors("Amount"));
    assert!(!profile.property_has_errors("Age"));
    assert_eq!(
        texts(profile.errors(None)),
        vec!["Not a number", "The Name field is required."]
    );

    // Each property on its own agrees with the sweep.
    let individually = ["Name", "Nickname", "Age", "Amount"]
        .iter()
        .map(|name| profile.validate(Some(name)).unwrap())
        .fold(true, |acc, valid| acc && valid);
    assert_eq!(individually, !profile.has_errors());
}

#[test]
fn test_unknown_property_fails_fast() {
    let mut profile = observe(Profile {
        age: 1,
        ..valid_profile()
    });
    profile.validate(Some("Age")).unwrap();
    let before = profile.errors(None);

    let err = profile.validate(Some("Missing")).unwrap_err();
    assert_eq!(err, ValidationError::unknown_property("Missing"));
    assert_eq!(profile.errors(None), before);

    assert!(profile.clear_errors(Some("Missing")).is_err());
    assert!(profile.add_errors("Missing", ["x"]).is_err());
    assert!(profile.raise_property_changed(Some("Missing")).is_err());
    assert_eq!(profile.errors(None), before);
}

#[test]
fn test_internal_revalidation_keeps_user_errors() {
    let mut profile = Observable::with_config(valid_profile(), ValidationConfig::new()).unwrap();

    profile.add_errors("Nickname", ["Nickname is taken"]).unwrap();
    profile.set("Age", |p| &mut p.age, 5).unwrap();
    profile.update(None, |p| p.age = 6).unwrap();

    assert_eq!(
        texts(profile.errors(Some("Nickname"))),
        vec!["Nickname is taken"]
    );
    assert!(profile.property_has_errors("Age"));

    profile.set("Age", |p| &mut p.age, 40).unwrap();
    assert!(!profile.property_has_errors("Age"));
    assert!(profile.has_errors());

    assert!(profile.clear_errors(None).unwrap());
    assert!(!profile.has_errors());
}

#[test]
fn test_internal_and_user_errors_are_concatenated() {
    let mut profile = Observable::with_config(
        Profile {
            age: 3,
            ..valid_profile()
        },
        ValidationConfig::new(),
    )
    .unwrap();

    profile.raise_property_changed(Some("Age")).unwrap();
    profile.add_errors("Age", ["Ask a parent"]).unwrap();

    assert_eq!(
        texts(profile.errors(Some("Age"))),
        vec!["Value must be between 18 and 130.", "Ask a parent"]
    );
}

#[test]
fn test_warnings_follow_errors() {
    let mut profile = observe(valid_profile());
    profile.add_warnings("Nickname", ["Looks like a bot"]).unwrap();
    profile.add_errors("Nickname", ["e1", "e2"]).unwrap();
    assert_eq!(
        texts(profile.errors(Some("Nickname"))),
        vec!["e2", "e1", "Looks like a bot"]
    );
}

#[test]
fn test_registry_batch_raises_one_notification() {
    let mut profile = observe(Profile {
        nickname: "x".to_string(),
        ..valid_profile()
    });
    profile
        .register::<String, _>("Nickname", Arc::new(MaxLength::new(0, "too long")))
        .unwrap();
    profile
        .register_fn("Nickname", |v: &String| {
            ValidationOutcome::check(v.len() > 3, "too short")
        })
        .unwrap();

    let fired = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&fired);
    profile
        .notifier()
        .on_errors_changed(move |_: &ErrorsChanged| *sink.borrow_mut() += 1);

    assert!(!profile.validate(Some("Nickname")).unwrap());
    assert_eq!(*fired.borrow(), 1);
    assert_eq!(profile.errors(Some("Nickname")).len(), 2);
}

#[test]
fn test_duplicate_rule_registration_is_ignored() {
    let mut profile = observe(valid_profile());
    let rule = Arc::new(Required::new("Nickname is required"));

    assert!(profile.register::<String, _>("Nickname", Arc::clone(&rule)).unwrap());
    assert!(!profile.register::<String, _>("Nickname", Arc::clone(&rule)).unwrap());
    assert_eq!(profile.registry().rule_count("Nickname"), 1);

    let again = AnyRule::new::<String, _>(Arc::clone(&rule));
    assert_eq!(profile.register_all("Nickname", [again]).unwrap(), 0);
}

#[test]
fn test_registration_checks_schema() {
    let mut profile = observe(valid_profile());

    let err = profile
        .register::<String, _>("Nope", Arc::new(Required::new("x")))
        .unwrap_err();
    assert_eq!(err, ValidationError::unknown_property("Nope"));

    let err = profile
        .register::<String, _>("Age", Arc::new(Required::new("x")))
        .unwrap_err();
    assert!(matches!(err, ValidationError::TypeMismatch { .. }));

    let mixed = [
        AnyRule::new::<String, _>(Arc::new(Required::new("a"))),
        AnyRule::new::<u32, _>(Arc::new(Range::new(0u32, 1u32))),
    ];
    assert!(profile.register_all("Nickname", mixed).is_err());
    assert_eq!(profile.registry().rule_count("Nickname"), 0);
}

#[test]
fn test_object_rules_run_in_sweeps() {
    let mut profile = observe(Profile {
        nickname: "Ada".to_string(),
        ..valid_profile()
    });
    profile
        .rules()
        .register_object_fn(|p: &Profile| {
            ValidationOutcome::check(p.name != p.nickname, "Nickname must differ from name")
        })
        .unwrap();

    assert!(profile.validate(Some("Name")).unwrap());
    assert!(!profile.validate(None).unwrap());
    assert_eq!(
        texts(profile.errors(Some(WILDCARD))),
        vec!["Nickname must differ from name"]
    );
    assert_eq!(profile.registry().rule_count(WILDCARD), 1);
}

#[test]
fn test_validate_value_bypasses_registry() {
    let mut profile = observe(Profile {
        age: 3,
        ..valid_profile()
    });

    let valid = profile
        .validate_value("Age", &50u32, |v, _| {
            ValidationOutcome::check(*v < 40, "Too old for this check")
        })
        .unwrap();
    assert!(!valid);
    assert_eq!(
        texts(profile.errors(Some("Age"))),
        vec!["Too old for this check"]
    );

    let err = profile
        .validate_value("Age", &"50".to_string(), |_, _| ValidationOutcome::VALID)
        .unwrap_err();
    assert!(matches!(err, ValidationError::TypeMismatch { .. }));
}

#[test]
fn test_culture_is_threaded_into_rules() {
    let german = Observable::with_config(
        Profile {
            amount: "1.234,5".to_string(),
            ..valid_profile()
        },
        ValidationConfig::new().culture(Culture::new("de-DE")),
    );
    let mut german = german.unwrap();
    assert!(german.validate(Some("Amount")).unwrap());

    let seen = Arc::new(std::sync::Mutex::new(String::new()));
    let sink = Arc::clone(&seen);
    german
        .register_fn_with_culture("Nickname", move |_: &String, culture: &Culture| {
            if let Ok(mut tag) = sink.lock() {
                *tag = culture.tag().to_string();
            }
            ValidationOutcome::VALID
        })
        .unwrap();
    german.validate(Some("Nickname")).unwrap();
    assert_eq!(*seen.lock().unwrap(), "de-DE");
}

#[test]
fn test_validate_on_construct() {
    let profile = Observable::with_config(
        Profile {
            age: 2,
            ..valid_profile()
        },
        ValidationConfig::new().validate_on_construct(),
    )
    .unwrap();
    assert!(profile.property_has_errors("Age"));
    assert_eq!(
        profile
            .error_store()
            .namespace_errors("Age", ErrorNamespace::Internal)
            .len(),
        1
    );
}

struct ShoutingOracle;

impl AttributeOracle for ShoutingOracle {
    fn check(
        &self,
        _object: &dyn Any,
        property: &str,
        value: &dyn Any,
        _constraints: &[Constraint],
    ) -> Vec<ErrorPayload> {
        match value.downcast_ref::<String>() {
            Some(text) if text.chars().any(char::is_lowercase) => {
                vec![ErrorPayload::coded("SHOUT", format!("{} must be upper case", property))]
            }
            _ => Vec::new(),
        }
    }

    fn check_object(&self, object: &dyn Any) -> Vec<ErrorPayload> {
        match object.downcast_ref::<Profile>() {
            Some(p) if p.nickname.is_empty() => vec!["Profile needs a nickname".into()],
            _ => Vec::new(),
        }
    }
}

#[test]
fn test_custom_oracle() {
    let mut profile = Observable::with_oracle(
        Profile {
            nickname: String::new(),
            ..valid_profile()
        },
        ValidationConfig::new().manual(),
        ShoutingOracle,
    )
    .unwrap();

    // Only attributed properties reach the oracle.
    assert!(profile.validate(Some("Nickname")).unwrap());
    assert!(!profile.validate(Some("Name")).unwrap());
    assert_eq!(
        profile.errors(Some("Name")),
        vec![ErrorPayload::coded("SHOUT", "Name must be upper case")]
    );

    assert!(!profile.validate(None).unwrap());
    assert_eq!(
        texts(profile.errors(Some(WILDCARD))),
        vec!["Profile needs a nickname", "Name must be upper case"]
    );
}
