// src/handlers/exam.rs

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use rand::{Rng, seq::SliceRandom};
use serde::Deserialize;
use sqlx::PgPool;

use crate::{
    config::{HARD_MODE_QUESTION_COUNT, POINTS_PER_LEVEL},
    error::AppError,
    models::{
        exam_result::{
            AnswerReview, ExamResult, LiveExamResponse, SubmitExamRequest, SubmitExamResponse,
        },
        question::{PublicQuestion, Question},
        question_set::QuestionSet,
    },
    utils::jwt::Claims,
};

/// Query flags for the live exam.
#[derive(Debug, Default, Deserialize)]
pub struct LiveExamParams {
    /// Shuffle question order and the options inside each question.
    #[serde(default)]
    pub shuffle: bool,
    /// Serve a random subset of `HARD_MODE_QUESTION_COUNT` questions.
    #[serde(default)]
    pub hard_mode: bool,
}

/// Turns the stored questions of a set into the paper handed to a student.
///
/// Answer keys are dropped here. Hard mode always randomizes order, since the
/// subset is drawn from a shuffled list.
fn prepare_paper<R: Rng + ?Sized>(
    questions: Vec<Question>,
    params: &LiveExamParams,
    rng: &mut R,
) -> Vec<PublicQuestion> {
    let mut paper: Vec<PublicQuestion> = questions.into_iter().map(PublicQuestion::from).collect();

    if params.shuffle || params.hard_mode {
        paper.shuffle(rng);
    }

    if params.hard_mode {
        paper.truncate(HARD_MODE_QUESTION_COUNT);
    }

    if params.shuffle {
        for question in &mut paper {
            question.options.shuffle(rng);
        }
    }

    paper
}

/// Scores submitted answers against the answer keys of the same questions.
///
/// One mark per correct answer. Comparison is exact after trimming surrounding
/// whitespace; an unanswered question (`None`) is never correct.
/// Returns the score and a review sorted by question id.
fn calculate_score(
    answers: &HashMap<i32, Option<String>>,
    keys: &[Question],
) -> (i32, Vec<AnswerReview>) {
    let mut score = 0;
    let mut review: Vec<AnswerReview> = keys
        .iter()
        .map(|q| {
            let your_answer = answers
                .get(&q.id)
                .cloned()
                .flatten()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty());
            let is_correct = your_answer.as_deref() == Some(q.correct_option.trim());
            if is_correct {
                score += 1;
            }
            AnswerReview {
                question_id: q.id,
                question_text: q.question_text.clone(),
                your_answer,
                correct_option: q.correct_option.clone(),
                is_correct,
            }
        })
        .collect();

    review.sort_by_key(|r| r.question_id);
    (score, review)
}

/// Level reached with the given accumulated points. Level 1 starts at 0 points.
pub fn level_for_points(points: i32) -> i32 {
    1 + points.max(0) / POINTS_PER_LEVEL
}

/// Serves the currently active question set.
///
/// * Picks the active set (newest if more than one is flagged).
/// * Applies the optional shuffle / hard mode policies.
/// * Never includes correct options.
pub async fn get_live_exam(
    State(pool): State<PgPool>,
    Query(params): Query<LiveExamParams>,
) -> Result<impl IntoResponse, AppError> {
    let set = sqlx::query_as::<_, QuestionSet>(
        r#"
        SELECT id, name, category, is_active, exam_time_minutes, created_at
        FROM question_sets
        WHERE is_active = TRUE
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch active question set: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("No live exam at the moment".to_string()))?;

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, set_id, question_text, options, correct_option
        FROM questions
        WHERE set_id = $1
        ORDER BY id
        "#,
    )
    .bind(set.id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch questions for set {}: {:?}", set.id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    let questions = prepare_paper(questions, &params, &mut rand::thread_rng());

    Ok(Json(LiveExamResponse {
        set_id: set.id,
        name: set.name,
        category: set.category,
        exam_time_minutes: set.exam_time_minutes,
        total_questions: questions.len(),
        questions,
    }))
}

/// Submits a user's exam answers and records the result.
///
/// * Extracts the User ID from the token.
/// * Rejects question ids that are not part of the set.
/// * Inserts the result and adds the score to the user's points in one transaction.
/// * Returns the score along with the correct answers for review.
pub async fn submit_exam(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.answers.is_empty() {
        return Err(AppError::BadRequest("No answers submitted".to_string()));
    }

    let user_id = claims.user_id()?;

    let set_exists: Option<(i32,)> = sqlx::query_as("SELECT id FROM question_sets WHERE id = $1")
        .bind(req.set_id)
        .fetch_optional(&pool)
        .await?;
    if set_exists.is_none() {
        return Err(AppError::NotFound("Question set not found".to_string()));
    }

    let question_ids: Vec<i32> = req.answers.keys().copied().collect();

    let keys = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, set_id, question_text, options, correct_option
        FROM questions
        WHERE set_id = $1 AND id = ANY($2)
        "#,
    )
    .bind(req.set_id)
    .bind(&question_ids[..])
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch answer keys: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if keys.len() != question_ids.len() {
        let mut unknown: Vec<i32> = question_ids
            .iter()
            .copied()
            .filter(|id| !keys.iter().any(|q| q.id == *id))
            .collect();
        unknown.sort_unstable();
        return Err(AppError::BadRequest(format!(
            "Questions {:?} do not belong to set {}",
            unknown, req.set_id
        )));
    }

    let (score, review) = calculate_score(&req.answers, &keys);
    let total_marks = keys.len() as i32;

    let mut tx = pool.begin().await?;

    // Lock the user row first; a deleted account aborts before anything is written.
    let points: i32 = sqlx::query_scalar(
        "UPDATE users SET points = points + $1 WHERE id = $2 RETURNING points",
    )
    .bind(score)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    let level = level_for_points(points);
    sqlx::query("UPDATE users SET level = $1 WHERE id = $2")
        .bind(level)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query_as::<_, ExamResult>(
        r#"
        INSERT INTO results (user_id, set_id, score, total_marks)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, set_id, score, total_marks, submitted_at
        "#,
    )
    .bind(user_id)
    .bind(req.set_id)
    .bind(score)
    .bind(total_marks)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to save exam result: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tx.commit().await?;

    tracing::info!(
        user_id,
        set_id = req.set_id,
        score,
        total_marks,
        "Exam submitted"
    );

    Ok(Json(SubmitExamResponse {
        result_id: result.id,
        set_id: result.set_id,
        score: result.score,
        total_marks: result.total_marks,
        points,
        level,
        review,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use sqlx::types::Json as SqlJson;

    fn question(id: i32, correct: &str) -> Question {
        Question {
            id,
            set_id: 1,
            question_text: format!("Question {}", id),
            options: SqlJson(vec!["A".into(), "B".into(), "C".into(), "D".into()]),
            correct_option: correct.to_string(),
        }
    }

    fn bank(n: i32) -> Vec<Question> {
        (1..=n).map(|i| question(i, "A")).collect()
    }

    #[test]
    fn test_calculate_score_perfect() {
        let keys = vec![question(1, "A"), question(2, "B")];
        let answers = HashMap::from([(1, Some("A".to_string())), (2, Some("B".to_string()))]);

        let (score, review) = calculate_score(&answers, &keys);
        assert_eq!(score, 2);
        assert!(review.iter().all(|r| r.is_correct));
    }

    #[test]
    fn test_calculate_score_partial_and_unanswered() {
        let keys = vec![question(1, "A"), question(2, "B"), question(3, "C")];
        let answers = HashMap::from([
            (1, Some(" A ".to_string())),
            (2, Some("C".to_string())), // Wrong
            (3, None),
        ]);

        let (score, review) = calculate_score(&answers, &keys);
        assert_eq!(score, 1);
        assert_eq!(review.len(), 3);
        assert_eq!(review[0].your_answer.as_deref(), Some("A"));
        assert!(!review[1].is_correct);
        assert_eq!(review[1].correct_option, "B");
        assert_eq!(review[2].your_answer, None);
        assert!(!review[2].is_correct);
    }

    #[test]
    fn test_calculate_score_review_sorted_by_id() {
        let keys = vec![question(9, "A"), question(2, "A"), question(5, "A")];
        let answers = HashMap::from([(9, None), (2, None), (5, None)]);

        let (score, review) = calculate_score(&answers, &keys);
        assert_eq!(score, 0);
        let ids: Vec<i32> = review.iter().map(|r| r.question_id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn test_level_for_points() {
        assert_eq!(level_for_points(0), 1);
        assert_eq!(level_for_points(99), 1);
        assert_eq!(level_for_points(100), 2);
        assert_eq!(level_for_points(250), 3);
        assert_eq!(level_for_points(-5), 1);
    }

    #[test]
    fn test_prepare_paper_default_keeps_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let paper = prepare_paper(bank(5), &LiveExamParams::default(), &mut rng);
        let ids: Vec<i32> = paper.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(paper[0].options, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_prepare_paper_shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let params = LiveExamParams {
            shuffle: true,
            hard_mode: false,
        };
        let paper = prepare_paper(bank(40), &params, &mut rng);

        assert_eq!(paper.len(), 40);
        let mut ids: Vec<i32> = paper.iter().map(|q| q.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=40).collect::<Vec<_>>());

        for q in &paper {
            let mut options = q.options.clone();
            options.sort();
            assert_eq!(options, vec!["A", "B", "C", "D"]);
        }
    }

    #[test]
    fn test_prepare_paper_hard_mode_limits_to_thirty_distinct() {
        let mut rng = StdRng::seed_from_u64(11);
        let params = LiveExamParams {
            shuffle: false,
            hard_mode: true,
        };
        let paper = prepare_paper(bank(100), &params, &mut rng);

        assert_eq!(paper.len(), HARD_MODE_QUESTION_COUNT);
        let mut ids: Vec<i32> = paper.iter().map(|q| q.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), HARD_MODE_QUESTION_COUNT);
        assert!(ids.iter().all(|id| (1..=100).contains(id)));
    }

    #[test]
    fn test_prepare_paper_hard_mode_small_set_serves_all() {
        let mut rng = StdRng::seed_from_u64(3);
        let params = LiveExamParams {
            shuffle: false,
            hard_mode: true,
        };
        assert_eq!(prepare_paper(bank(12), &params, &mut rng).len(), 12);
    }
}
