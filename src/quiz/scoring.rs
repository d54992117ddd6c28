//! Pure scoring logic for quiz submissions. No I/O here.

use super::repo::MoodResult;

/// One validated answer from a submission batch.
#[derive(Debug, Clone)]
pub struct AnswerTriple {
    pub question_id: String,
    pub answer_index: i32,
    pub category: String,
}

/// Per-category tallies. A category outside the three named buckets
/// contributes to no sub-score; that is the observed product behavior and
/// is preserved as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scores {
    pub cognitive: i32,
    pub physical: i32,
    pub digital: i32,
}

impl Scores {
    pub fn balance(&self) -> i32 {
        self.cognitive + self.physical + self.digital
    }
}

pub fn tally(answers: &[AnswerTriple]) -> Scores {
    let mut scores = Scores {
        cognitive: 0,
        physical: 0,
        digital: 0,
    };
    for answer in answers {
        match answer.category.to_lowercase().as_str() {
            "cognitive" => scores.cognitive += 1,
            "physical" => scores.physical += 1,
            "digital" => scores.digital += 1,
            _ => {}
        }
    }
    scores
}

pub fn mood_for(balance: i32) -> MoodResult {
    if balance >= 15 {
        MoodResult::Balanced
    } else if balance >= 8 {
        MoodResult::NeedsAttention
    } else {
        MoodResult::Overloaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(category: &str) -> AnswerTriple {
        AnswerTriple {
            question_id: "q".to_string(),
            answer_index: 0,
            category: category.to_string(),
        }
    }

    #[test]
    fn balance_is_exact_sum_of_sub_scores() {
        let answers: Vec<_> = ["cognitive", "Cognitive", "physical", "digital", "digital"]
            .iter()
            .map(|c| answer(c))
            .collect();
        let scores = tally(&answers);
        assert_eq!(scores.cognitive, 2);
        assert_eq!(scores.physical, 1);
        assert_eq!(scores.digital, 2);
        assert_eq!(scores.balance(), 5);
    }

    #[test]
    fn unmatched_categories_score_nothing() {
        let answers: Vec<_> = ["Sleep Health", "Nutrition", "Mental Health"]
            .iter()
            .map(|c| answer(c))
            .collect();
        let scores = tally(&answers);
        assert_eq!(scores.balance(), 0);
        assert_eq!(mood_for(scores.balance()), MoodResult::Overloaded);
    }

    #[test]
    fn category_matching_is_case_insensitive() {
        let scores = tally(&[answer("COGNITIVE"), answer("pHySiCaL")]);
        assert_eq!(scores.cognitive, 1);
        assert_eq!(scores.physical, 1);
    }

    #[test]
    fn mood_thresholds_at_boundaries() {
        assert_eq!(mood_for(7), MoodResult::Overloaded);
        assert_eq!(mood_for(8), MoodResult::NeedsAttention);
        assert_eq!(mood_for(14), MoodResult::NeedsAttention);
        assert_eq!(mood_for(15), MoodResult::Balanced);
        assert_eq!(mood_for(0), MoodResult::Overloaded);
    }

    #[test]
    fn three_answers_one_per_bucket() {
        let answers = vec![answer("cognitive"), answer("physical"), answer("digital")];
        let scores = tally(&answers);
        assert_eq!(
            (scores.cognitive, scores.physical, scores.digital),
            (1, 1, 1)
        );
        assert_eq!(scores.balance(), 3);
        assert_eq!(mood_for(scores.balance()), MoodResult::Overloaded);
    }
}
