use rmcp::model::{GetPromptResult, PromptMessage, PromptMessageRole};

pub fn daily_health_review_prompt(date: &str) -> GetPromptResult {
    GetPromptResult {
        description: Some(format!("Health review for {}", date)),
        messages: vec![PromptMessage::new_text(
            PromptMessageRole::User,
            format!(
                "Review my Garmin health data for {date}.\n\nInclude:\n1. Daily summary (steps, calories, stress, body battery)\n2. Sleep duration and sleep stages\n3. Resting heart rate and notable heart rate peaks\n4. Step distribution across the day\n5. Body weight if recorded\n\nUse user_summary, user_sleep, user_heart_rate, user_steps and user_weight with date=\"{date}\". Finish with two or three concrete recommendations for today.",
            ),
        )],
    }
}
