//! Structured responses for lookups that produced no data.
//!
//! Every one carries confidence 0, an empty source breakdown, an
//! explanation, and at least one next step.

use ic_protocol::{NextStep, Outcome, Priority, Response};

use crate::classifier::Identifier;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::normalize::wmi_manufacturer;

#[derive(Debug, Clone)]
pub struct GapReporter {
    max_suggestions: usize,
}

impl GapReporter {
    pub fn new(max_suggestions: usize) -> Self {
        Self { max_suggestions }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.max_fallback_suggestions)
    }

    /// All resolver stages missed.
    ///
    /// `keywords` are "did you mean" candidates from the fallback-keyword
    /// table; VINs additionally get a manufacturer hint from their WMI.
    pub fn no_match<T>(&self, id: &Identifier, keywords: Vec<String>) -> Response<T> {
        let why = format!(
            "No exact, partial or heuristic match was found for \"{}\". Likely causes: \
             the vehicle is not yet in our database, the identifier is malformed or \
             mistyped, or it is a rare variant.",
            id.as_str()
        );

        let mut steps = manual_steps();
        if matches!(id, Identifier::Vin(_)) {
            steps.push(NextStep::new(
                "Double-check the VIN",
                "Compare the VIN against the chassis plate and registration documents.",
                Priority::Medium,
                "verify_vin",
            ));
        }

        let mut suggestions = Vec::new();
        if let Identifier::Vin(vin) = id
            && let Some(hint) = wmi_hint(vin)
        {
            suggestions.push(hint);
        }
        for keyword in keywords {
            if !suggestions.contains(&keyword) {
                suggestions.push(keyword);
            }
        }
        suggestions.truncate(self.max_suggestions);

        Response::empty(Outcome::NoMatch, why, steps).with_fallback_suggestions(suggestions)
    }

    /// Reference data (policy, routes, samples) missing for a valid request.
    pub fn no_data<T>(&self, what: &str, next_steps: Vec<NextStep>) -> Response<T> {
        let why = format!(
            "No {what} is on file yet. This is a gap in our reference data, not an error \
             in your request."
        );
        Response::empty(Outcome::NoMatch, why, next_steps)
    }

    pub fn invalid_input<T>(&self, reason: &str) -> Response<T> {
        let mut steps = vec![NextStep::new(
            "Check the identifier",
            "Enter a full 17-character VIN, a chassis code such as JZA80, or a make and model.",
            Priority::High,
            "fix_input",
        )];
        steps.extend(manual_steps().into_iter().take(1));
        Response::empty(Outcome::InvalidInput, format!("Invalid input: {reason}."), steps)
    }

    /// A store or runtime failure converted at the public boundary.
    pub fn system_error<T>(&self, err: &EngineError) -> Response<T> {
        let why = match err {
            EngineError::Cancelled => "The lookup was cancelled before it completed.".to_string(),
            EngineError::DeadlineExceeded => {
                "The lookup did not complete before its deadline.".to_string()
            }
            _ => "A temporary system error prevented this lookup from completing.".to_string(),
        };
        let steps = vec![
            NextStep::new(
                "Retry the lookup",
                "The failure was on our side; the same request may succeed shortly.",
                Priority::High,
                "retry",
            )
            .with_estimated_time("1 minute"),
        ];
        Response::empty(Outcome::SystemError, why, steps)
    }
}

/// "Manufacturer code JN1 suggests Nissan".
pub fn wmi_hint(vin: &str) -> Option<String> {
    let make = wmi_manufacturer(vin)?;
    let wmi = vin.get(..3)?.to_uppercase();
    Some(format!("Manufacturer code {wmi} suggests {make}"))
}

fn manual_steps() -> Vec<NextStep> {
    vec![
        NextStep::new(
            "Enter vehicle details manually",
            "Provide make, model and year so compliance, shipping and market data can still be looked up.",
            Priority::High,
            "manual_entry",
        )
        .with_estimated_time("2 minutes"),
        NextStep::new(
            "Look up by chassis code",
            "The chassis code on the build plate (e.g. BNR34, JZA80) identifies the generation precisely.",
            Priority::Medium,
            "chassis_lookup",
        ),
    ]
}
