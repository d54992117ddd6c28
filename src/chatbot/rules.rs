//! Scripted reply table for the wellness chatbot. A rule matches when any
//! of its keywords appears in the lowercased message; rules are evaluated
//! top to bottom and the first match wins. Pure function, no I/O.

pub struct Rule {
    pub topic: &'static str,
    pub keywords: &'static [&'static str],
    pub reply: &'static str,
}

pub const RULES: &[Rule] = &[
    Rule {
        topic: "stress",
        keywords: &["stress", "anxious", "anxiety"],
        reply: "I understand you're feeling stressed. Here are some quick techniques:\n\n\
                1. Deep breathing: try the 4-7-8 technique (inhale 4s, hold 7s, exhale 8s)\n\
                2. Progressive muscle relaxation\n\
                3. Take a short walk outside\n\
                4. Listen to calming music\n\n\
                Would you like me to guide you through a 5-minute meditation?",
    },
    Rule {
        topic: "sleep",
        keywords: &["sleep", "insomnia"],
        reply: "Good sleep is crucial for wellness! Here are my recommendations:\n\n\
                - Maintain a consistent sleep schedule\n\
                - Create a relaxing bedtime routine\n\
                - Limit screen time 1 hour before bed\n\
                - Keep your bedroom cool\n\n\
                Would you like personalized sleep improvement tips?",
    },
    Rule {
        topic: "nutrition",
        keywords: &["food", "meal", "eat", "nutrition"],
        reply: "Great question about nutrition! For optimal wellness, focus on:\n\n\
                - Whole foods and vegetables\n\
                - Healthy fats (avocado, nuts, olive oil)\n\
                - Lean proteins (fish, chicken, legumes)\n\
                - Staying hydrated\n\n\
                Would you like meal-planning suggestions?",
    },
    Rule {
        topic: "exercise",
        keywords: &["exercise", "workout", "fitness"],
        reply: "Let's get moving! A balanced week looks like:\n\n\
                - Cardio: 150 min of moderate activity\n\
                - Strength: 2-3 sessions\n\
                - Flexibility: daily stretching\n\n\
                Want to see a personalized exercise plan?",
    },
    Rule {
        topic: "hydration",
        keywords: &["water", "hydration", "drink"],
        reply: "Hydration is key! Benefits of drinking enough water:\n\n\
                - Better energy levels\n\
                - Improved focus\n\
                - Healthier skin\n\
                - Better digestion\n\n\
                I can send you reminders throughout the day. Would you like that?",
    },
    Rule {
        topic: "weight",
        keywords: &["weight", "lose"],
        reply: "Healthy weight management is about sustainable habits, not quick fixes.\n\n\
                Key principles:\n\
                - Track your calories mindfully\n\
                - Practice portion control\n\
                - Eat regularly (don't skip meals)\n\
                - Stay active daily\n\
                - Get adequate sleep",
    },
    Rule {
        topic: "mood",
        keywords: &["mood", "feeling", "happy", "sad"],
        reply: "Thank you for sharing how you're feeling. Emotional wellness is just as \
                important as physical health.\n\n\
                Activities that boost mood:\n\
                - Spend time with loved ones\n\
                - Exercise releases endorphins\n\
                - Practice gratitude journaling\n\
                - Get sunlight exposure\n\n\
                Would you like to do a mood journaling session now?",
    },
];

pub const FALLBACK_TOPIC: &str = "general";
pub const FALLBACK_REPLY: &str =
    "I'm here to help with your wellness journey! I can assist with:\n\n\
     - Nutrition & meal planning\n\
     - Fitness & exercise guidance\n\
     - Sleep optimization\n\
     - Mental health support\n\
     - Hydration tracking\n\
     - Progress analysis\n\n\
     Feel free to ask me anything!";

/// First matching rule wins; unmatched input gets the fallback.
pub fn reply_for(message: &str) -> (&'static str, &'static str) {
    let lowered = message.to_lowercase();
    for rule in RULES {
        if rule.keywords.iter().any(|kw| lowered.contains(kw)) {
            return (rule.topic, rule.reply);
        }
    }
    (FALLBACK_TOPIC, FALLBACK_REPLY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_matching_is_case_insensitive() {
        let (topic, _) = reply_for("I'm SO STRESSED about work");
        assert_eq!(topic, "stress");
    }

    #[test]
    fn first_matching_rule_wins() {
        // "sleep" appears in an earlier rule than "mood"
        let (topic, _) = reply_for("my sleep affects my mood");
        assert_eq!(topic, "sleep");
    }

    #[test]
    fn unmatched_input_falls_back() {
        let (topic, reply) = reply_for("tell me about quantum physics");
        assert_eq!(topic, FALLBACK_TOPIC);
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[test]
    fn every_rule_is_reachable_by_its_own_keywords() {
        for rule in RULES {
            for kw in rule.keywords {
                let (topic, _) = reply_for(kw);
                // an earlier rule may shadow a keyword; assert it never
                // falls through to the fallback
                assert_ne!(topic, FALLBACK_TOPIC, "keyword {kw} hit the fallback");
            }
        }
    }
}
