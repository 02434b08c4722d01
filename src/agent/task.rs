//! Agent and task definitions sent to the orchestration service

use serde::Serialize;
use serde_json::{Value, json};

pub const AGENT_NAME: &str = "FoodieTourAgent";
pub const AGENT_ABOUT: &str = "Agent for interactive foodie tours with maps";
pub const TASK_NAME: &str = "Foodie Tour Planner";

const SYSTEM_PROMPT: &str = "You are a fun food-and-travel assistant. Output JSON:
dining (Indoor/Outdoor), dishes (3 strings), restaurants (map dish->[3]),
itinerary (string), bonus_stop (string), trivia (string).";

// Placeholders are rendered by the service from the execution input
const USER_PROMPT: &str = "City: ${steps[0].input.city}
Temp: ${steps[0].input.temp}°C
Condition: ${steps[0].input.condition}
Preferences: ${steps[0].input.prefs}
Surprise Bonus: ${steps[0].input.surprise}
Output valid JSON only.";

#[derive(Debug, Serialize)]
pub struct CreateAgent<'a> {
    pub name: &'a str,
    pub model: &'a str,
    pub about: &'a str,
}

/// The single prompt step with its five input slots
#[must_use]
pub fn task_definition() -> Value {
    json!({
        "name": TASK_NAME,
        "main": [{
            "prompt": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": USER_PROMPT}
            ]
        }]
    })
}

/// Values for the five slots of one execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionInput {
    pub city: String,
    pub temp: f64,
    pub condition: String,
    pub prefs: Vec<String>,
    pub surprise: bool,
}
