use std::fs;

use pipeflow_core::{Event, Score};
use pipeflow_system_top_score::{
    FileScoreStore, MemoryScoreStore, ScoreStore, ScoreStoreError, TopScore,
};

fn game_over(score: i64) -> Event {
    Event::GameOver {
        stage: 1,
        score: Score::new(score),
    }
}

#[test]
fn missing_file_reads_as_zero_and_is_created_on_record() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("topscore.txt");
    let mut top = TopScore::new(FileScoreStore::new(&path));
    assert_eq!(top.best(), Score::default());

    let record = top.handle(&[game_over(1_650)]);

    assert_eq!(record, Some(Score::new(1_650)));
    assert_eq!(
        fs::read_to_string(&path).expect("file written"),
        "TopScore = 1650\n"
    );
}

#[test]
fn lower_scores_leave_the_file_alone() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("topscore.txt");
    fs::write(&path, "TopScore = 3000\n").expect("seed file");

    let mut top = TopScore::new(FileScoreStore::new(&path));
    assert_eq!(top.best(), Score::new(3_000));
    assert_eq!(top.handle(&[game_over(2_999), game_over(3_000)]), None);
    assert_eq!(
        fs::read_to_string(&path).expect("file kept"),
        "TopScore = 3000\n"
    );
}

#[test]
fn malformed_file_is_reported_and_treated_as_zero() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("topscore.txt");
    fs::write(&path, "not a score").expect("seed file");

    let store = FileScoreStore::new(&path);
    assert!(matches!(
        store.load(),
        Err(ScoreStoreError::Malformed { .. })
    ));

    let mut top = TopScore::new(store);
    assert_eq!(top.best(), Score::default());
    assert_eq!(top.handle(&[game_over(10)]), Some(Score::new(10)));
    assert_eq!(
        FileScoreStore::new(&path).load().expect("rewritten"),
        Score::new(10)
    );
}

#[test]
fn best_tracks_the_highest_of_several_games() {
    let mut top = TopScore::new(MemoryScoreStore::default());

    assert_eq!(top.handle(&[game_over(400)]), Some(Score::new(400)));
    assert_eq!(top.handle(&[game_over(300)]), None);
    assert_eq!(top.handle(&[game_over(900)]), Some(Score::new(900)));
    assert_eq!(top.best(), Score::new(900));
    assert_eq!(top.into_store().writes(), 2);
}

#[test]
fn unwritable_location_keeps_the_in_memory_best() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("missing").join("topscore.txt");
    let mut top = TopScore::new(FileScoreStore::new(&path));

    assert_eq!(top.handle(&[game_over(75)]), Some(Score::new(75)));
    assert_eq!(top.best(), Score::new(75));
    assert!(!path.exists());
}
