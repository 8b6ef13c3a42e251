//! Conversation stage state machine
//!
//! Each stage has its own handler. Greetings and "ok" are checked first for
//! every stage except `GetName`; anything a stage handler does not claim falls
//! through to symptom matching.

use std::collections::HashMap;
use std::sync::Arc;

use crate::knowledge::KnowledgeBase;
use crate::matcher::SymptomMatcher;
use crate::random::Randomness;
use crate::session::{SessionState, Stage};

/// Words that mark a message as a greeting when found anywhere in it
const GREETING_WORDS: [&str; 5] = ["hi", "hello", "hey", "greetings", "hola"];

/// Symptom duration (days) from which a doctor visit is recommended
pub const BOOKING_THRESHOLD_DAYS: i64 = 5;

const GREETING_TEMPLATES: [&str; 5] = [
    "👋 Hello {name}! How can I assist you today?",
    "Hi there, {name}! 😊 What brings you here?",
    "Greetings, {name}! 🌟 How may I help you?",
    "Welcome, {name}! 🤗 What would you like to know?",
    "Hey {name}! 👨‍⚕️ How can I be of service today?",
];

const RESET_PROMPT: &str = "Let's start over. What should I call you?";

const CLOSING_MESSAGE: &str = "Thank you for confirming. If you need further assistance, feel free to reach out. Have a great day ahead! 🌟\nPlease provide me your name.";

/// One incoming message, trimmed, with a lowercase copy for keyword checks
struct Input<'a> {
    text: &'a str,
    lowered: String,
}

impl<'a> Input<'a> {
    fn new(message: &'a str) -> Self {
        let text = message.trim();
        Self {
            text,
            lowered: text.to_lowercase(),
        }
    }

    fn is(&self, keyword: &str) -> bool {
        self.lowered == keyword
    }

    fn is_greeting(&self) -> bool {
        GREETING_WORDS
            .iter()
            .any(|word| self.lowered.contains(word))
    }
}

/// Most frequent condition; ties go to the one listed first
pub fn majority_condition<S: AsRef<str>>(conditions: &[S]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for condition in conditions {
        *counts.entry(condition.as_ref()).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for condition in conditions {
        let condition = condition.as_ref();
        let count = counts[condition];
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((condition, count));
        }
    }
    best.map(|(condition, _)| condition.to_string())
}

/// Rule-based triage conversation engine
#[derive(Clone)]
pub struct Engine {
    knowledge: Arc<KnowledgeBase>,
    matcher: Arc<dyn SymptomMatcher>,
    random: Arc<dyn Randomness>,
}

impl Engine {
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        matcher: Arc<dyn SymptomMatcher>,
        random: Arc<dyn Randomness>,
    ) -> Self {
        Self {
            knowledge,
            matcher,
            random,
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Advance `state` by one user message and return the reply text
    pub fn respond(&self, state: &mut SessionState, message: &str) -> String {
        let input = Input::new(message);

        if state.stage == Stage::GetName {
            return self.on_get_name(state, &input);
        }

        if input.is_greeting() {
            return self.greeting(display_name(state));
        }

        if input.is("ok") {
            state.reset();
            return CLOSING_MESSAGE.to_string();
        }

        match state.stage {
            Stage::GetName => self.on_get_name(state, &input),
            Stage::AskDuration => self.on_ask_duration(state, &input),
            Stage::EndConversation => self.on_end_conversation(state, &input),
            Stage::AskBooking => self.on_ask_booking(state, &input),
            Stage::Chat | Stage::AskTime => self.on_chat(state, &input),
        }
    }

    fn on_get_name(&self, state: &mut SessionState, input: &Input<'_>) -> String {
        if input.is("reset") {
            state.reset();
            return RESET_PROMPT.to_string();
        }

        state.name = Some(input.text.to_string());
        state.stage = Stage::Chat;
        self.greeting(input.text)
    }

    fn on_ask_duration(&self, state: &mut SessionState, input: &Input<'_>) -> String {
        let name = display_name(state).to_string();

        let Ok(days) = input.text.parse::<i64>() else {
            return format!(
                "I'm sorry, {name}, but I didn't understand that. Could you please enter the number of days you've been experiencing these symptoms?"
            );
        };

        state.duration = Some(days);

        if state.condition.is_none() {
            state.stage = Stage::Chat;
            return not_sure(&name);
        }

        if days >= BOOKING_THRESHOLD_DAYS {
            state.stage = Stage::AskBooking;
            format!(
                "{name}, since you've been experiencing these symptoms for {days} days, which is {BOOKING_THRESHOLD_DAYS} or more days, I recommend consulting a doctor. Would you like to book an appointment? (Yes/No)"
            )
        } else {
            state.stage = Stage::EndConversation;
            format!(
                "I understand, {name}. Since it's been less than {BOOKING_THRESHOLD_DAYS} days, please monitor your symptoms closely. If they persist or worsen, please consult a doctor. Is there anything else I can help you with?"
            )
        }
    }

    fn on_end_conversation(&self, state: &mut SessionState, input: &Input<'_>) -> String {
        if !input.is("no") {
            // Anything else is taken as a new symptom description
            return self.on_chat(state, input);
        }

        let reply = format!(
            "Thank you for using our service, {}. Take care and stay healthy! 😊",
            display_name(state)
        );
        state.reset();
        reply
    }

    fn on_ask_booking(&self, state: &mut SessionState, input: &Input<'_>) -> String {
        if input.is("yes") {
            state.stage = Stage::AskTime;
            return "Great! Let's proceed with booking your appointment. What time would you prefer for your appointment? (Please provide in HH:MM format)".to_string();
        }

        if input.is("no") {
            state.stage = Stage::EndConversation;
            return format!(
                "No worries, {}. If you change your mind, feel free to ask for help anytime.",
                display_name(state)
            );
        }

        self.on_chat(state, input)
    }

    fn on_chat(&self, state: &mut SessionState, input: &Input<'_>) -> String {
        let name = display_name(state).to_string();
        let symptoms = &self.knowledge.symptoms;

        let matched = self.matcher.match_symptoms(input.text, symptoms);
        if matched.is_empty() {
            return not_sure(&name);
        }
        state.symptoms.extend(matched);

        let implied: Vec<&str> = state
            .symptoms
            .iter()
            .flat_map(|symptom| symptoms.conditions_for(symptom))
            .map(String::as_str)
            .collect();

        let Some(condition) = majority_condition(&implied) else {
            return format!(
                "I've noted your symptoms, {name}. Could you provide more details about how you're feeling?"
            );
        };

        let treatments = self.knowledge.treatments.treatments_for(&condition);
        let reply = format!(
            "{name}, based on your symptoms, you may have {condition}. Suggested precautions or treatments include: {}.\n\n{name}, how many days have you been experiencing these symptoms?",
            treatments.join(", ")
        );

        state.condition = Some(condition);
        state.stage = Stage::AskDuration;
        reply
    }

    fn greeting(&self, name: &str) -> String {
        let template = GREETING_TEMPLATES[self.random.choose_index(GREETING_TEMPLATES.len())];
        template.replace("{name}", name)
    }
}

fn display_name(state: &SessionState) -> &str {
    state.name.as_deref().unwrap_or("there")
}

fn not_sure(name: &str) -> String {
    format!(
        "I'm not sure about your condition based on the information provided, {name}. Could you tell me more about your symptoms?"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{ConditionTreatmentIndex, SymptomConditionIndex};
    use crate::matcher::TokenOverlapMatcher;
    use crate::random::SeededRandomness;

    fn engine() -> Engine {
        let symptoms = SymptomConditionIndex::from_pairs([
            ("fever", "Flu"),
            ("fever", "Cold"),
            ("headache", "Flu"),
            ("headache", "Migraine"),
            ("rash", "Allergy"),
        ]);
        let treatments = ConditionTreatmentIndex::from_pairs([
            ("Flu", "Rest"),
            ("Flu", "Fluids"),
            ("Cold", "Warm tea"),
        ]);
        Engine::new(
            Arc::new(KnowledgeBase::new(symptoms, treatments)),
            Arc::new(TokenOverlapMatcher::new()),
            Arc::new(SeededRandomness::new(42)),
        )
    }

    fn named(stage: Stage) -> SessionState {
        SessionState {
            name: Some("Sam".to_string()),
            stage,
            ..Default::default()
        }
    }

    #[test]
    fn first_message_sets_name() {
        let engine = engine();
        let mut state = SessionState::new();

        let reply = engine.respond(&mut state, "  Sam ");

        assert!(reply.contains("Sam"));
        assert_eq!(state.name.as_deref(), Some("Sam"));
        assert_eq!(state.stage, Stage::Chat);
    }

    #[test]
    fn reset_in_get_name_clears_state() {
        let engine = engine();
        let mut state = SessionState {
            symptoms: vec!["fever".to_string()],
            duration: Some(2),
            ..Default::default()
        };

        let reply = engine.respond(&mut state, "RESET");

        assert_eq!(reply, RESET_PROMPT);
        assert_eq!(state, SessionState::new());
    }

    #[test]
    fn ok_resets_from_any_stage() {
        let engine = engine();
        for stage in [
            Stage::Chat,
            Stage::AskDuration,
            Stage::AskBooking,
            Stage::AskTime,
            Stage::EndConversation,
        ] {
            let mut state = named(stage);
            state.condition = Some("Flu".to_string());
            let reply = engine.respond(&mut state, "OK");
            assert_eq!(reply, CLOSING_MESSAGE);
            assert_eq!(state, SessionState::new(), "stage {stage:?}");
        }
    }

    #[test]
    fn greeting_keeps_stage() {
        let engine = engine();
        let mut state = named(Stage::AskBooking);

        let reply = engine.respond(&mut state, "Hello again");

        assert!(reply.contains("Sam"));
        assert_eq!(state.stage, Stage::AskBooking);
    }

    #[test]
    fn fever_and_headache_imply_flu() {
        let engine = engine();
        let mut state = named(Stage::Chat);

        let reply = engine.respond(&mut state, "I have a fever and headache");

        assert_eq!(state.condition.as_deref(), Some("Flu"));
        assert_eq!(state.symptoms, ["fever", "headache"]);
        assert_eq!(state.stage, Stage::AskDuration);
        assert!(reply.contains("you may have Flu"));
        assert!(reply.contains("Rest, Fluids"));
        assert!(reply.ends_with("how many days have you been experiencing these symptoms?"));
    }

    #[test]
    fn condition_without_treatments_uses_fallback() {
        let engine = engine();
        let mut state = named(Stage::Chat);

        let reply = engine.respond(&mut state, "an itchy rash");

        assert_eq!(state.condition.as_deref(), Some("Allergy"));
        assert!(reply.contains("Consult a healthcare professional"));
    }

    #[test]
    fn unmatched_text_asks_for_detail() {
        let engine = engine();
        let mut state = named(Stage::Chat);

        let reply = engine.respond(&mut state, "I feel strange");

        assert!(reply.contains("Could you tell me more about your symptoms?"));
        assert_eq!(state.stage, Stage::Chat);
        assert!(state.symptoms.is_empty());
        assert!(state.condition.is_none());
    }

    #[test]
    fn symptoms_accumulate_across_messages() {
        let engine = engine();
        let mut state = named(Stage::Chat);

        engine.respond(&mut state, "fever");
        assert_eq!(state.condition.as_deref(), Some("Flu"));

        state.stage = Stage::Chat;
        engine.respond(&mut state, "and a rash, also fever");
        assert_eq!(state.symptoms, ["fever", "fever", "rash"]);
        assert_eq!(state.condition.as_deref(), Some("Flu"));
    }

    #[test]
    fn long_duration_asks_about_booking() {
        let engine = engine();
        let mut state = named(Stage::AskDuration);
        state.condition = Some("Flu".to_string());

        let reply = engine.respond(&mut state, "5");

        assert_eq!(state.duration, Some(5));
        assert_eq!(state.stage, Stage::AskBooking);
        assert!(reply.contains("book an appointment"));
    }

    #[test]
    fn short_duration_ends_conversation() {
        let engine = engine();
        let mut state = named(Stage::AskDuration);
        state.condition = Some("Flu".to_string());

        let reply = engine.respond(&mut state, "4");

        assert_eq!(state.duration, Some(4));
        assert_eq!(state.stage, Stage::EndConversation);
        assert!(reply.contains("monitor your symptoms"));
    }

    #[test]
    fn unparseable_duration_reprompts() {
        let engine = engine();
        let mut state = named(Stage::AskDuration);
        state.condition = Some("Flu".to_string());

        let reply = engine.respond(&mut state, "a week");

        assert!(reply.contains("enter the number of days"));
        assert_eq!(state.stage, Stage::AskDuration);
        assert!(state.duration.is_none());
    }

    #[test]
    fn duration_without_condition_returns_to_chat() {
        let engine = engine();
        let mut state = named(Stage::AskDuration);

        engine.respond(&mut state, "10");

        assert_eq!(state.duration, Some(10));
        assert_eq!(state.stage, Stage::Chat);
    }

    #[test]
    fn booking_yes_asks_for_time() {
        let engine = engine();
        let mut state = named(Stage::AskBooking);

        let reply = engine.respond(&mut state, "Yes");

        assert!(reply.contains("HH:MM"));
        assert_eq!(state.stage, Stage::AskTime);
    }

    #[test]
    fn booking_no_moves_to_end() {
        let engine = engine();
        let mut state = named(Stage::AskBooking);

        let reply = engine.respond(&mut state, "no");

        assert!(reply.starts_with("No worries, Sam."));
        assert_eq!(state.stage, Stage::EndConversation);
    }

    #[test]
    fn end_conversation_no_says_goodbye() {
        let engine = engine();
        let mut state = named(Stage::EndConversation);
        state.condition = Some("Flu".to_string());

        let reply = engine.respond(&mut state, "No");

        assert!(reply.contains("Thank you for using our service, Sam."));
        assert_eq!(state, SessionState::new());
    }

    #[test]
    fn end_conversation_other_input_matches_symptoms() {
        let engine = engine();
        let mut state = named(Stage::EndConversation);

        engine.respond(&mut state, "actually there is a rash");

        assert_eq!(state.condition.as_deref(), Some("Allergy"));
        assert_eq!(state.stage, Stage::AskDuration);
    }

    #[test]
    fn majority_prefers_most_frequent_then_first_listed() {
        assert_eq!(
            majority_condition(&["Cold", "Flu", "Migraine", "Flu"]).as_deref(),
            Some("Flu")
        );
        assert_eq!(
            majority_condition(&["Migraine", "Flu", "Flu", "Migraine"]).as_deref(),
            Some("Migraine")
        );
        assert_eq!(majority_condition::<&str>(&[]), None);
    }

    #[test]
    fn greetings_are_seed_deterministic() {
        let a = engine();
        let b = engine();
        let replies_a: Vec<String> = (0..4).map(|_| a.greeting("Kim")).collect();
        let replies_b: Vec<String> = (0..4).map(|_| b.greeting("Kim")).collect();
        assert_eq!(replies_a, replies_b);
        assert!(replies_a.iter().all(|reply| reply.contains("Kim")));
    }
}
