use approx::assert_abs_diff_eq;
use mos_rater::models::{ModelIndexMap, mos_of_models};
use mos_rater::output::render_text;
use mos_rater::parser::{calculate_average_mos, read_survey};
use mos_rater::plot::model_distributions;
use mos_rater::stats::SONG_COUNT;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn test_mirrored_rows_average_to_midpoint() {
    let averages = calculate_average_mos(fixture("mirrored.csv"))
        .expect("Failed to read survey");
    assert!(averages.as_slice().iter().all(|&v| v == 10.5));

    let map = ModelIndexMap::builtin("v1").unwrap();
    let models = mos_of_models(&averages, &map);
    assert_eq!(models.len(), 5);
    assert!(models.iter().all(|m| m.mos == 10.5));
}

#[test]
fn test_full_pipeline_on_survey() {
    let survey = read_survey(fixture("survey.csv"), false)
        .expect("Failed to read survey");
    assert_eq!(survey.respondents, 4);

    let expected = [
        4.0, 4.0, 2.5, 4.5, 2.5, 2.5, 4.5, 4.5, 3.75, 2.5, 3.0, 4.0, 4.5, 4.5, 2.75, 2.0, 4.5,
        2.5, 4.5, 4.5,
    ];
    for (got, want) in survey.averages.as_slice().iter().zip(expected) {
        assert_abs_diff_eq!(*got, want);
    }

    let map = ModelIndexMap::builtin("v1").unwrap();
    let models = mos_of_models(&survey.averages, &map);
    assert_abs_diff_eq!(models.get("Expert").unwrap().mos, 4.375);
    assert_abs_diff_eq!(models.get("CP").unwrap().mos, 2.5);
    assert_abs_diff_eq!(models.get("LLaMA").unwrap().mos, 2.5625);
    assert_abs_diff_eq!(models.get("RL").unwrap().mos, 4.25);
    assert_abs_diff_eq!(models.get("RL+Novelty").unwrap().mos, 4.3125);

    let text = render_text(&survey.averages, &models, &[8]).unwrap();
    assert!(text.contains("\n  Expert: 4.3750\n"));
    assert!(text.contains("\n  LLaMA: 2.5625\n"));
    assert!(text.ends_with("Song 8: 4.5000\n"));
}

#[test]
fn test_alternative_index_map_changes_grouping() {
    let averages = calculate_average_mos(fixture("survey.csv")).unwrap();
    let v1 = ModelIndexMap::builtin("v1").unwrap();
    let striped = ModelIndexMap::load(fixture("striped_map.json")).unwrap();

    let under_v1 = mos_of_models(&averages, &v1);
    let under_striped = mos_of_models(&averages, &striped);
    assert_abs_diff_eq!(under_striped.get("Expert").unwrap().mos, 2.875);
    assert_ne!(under_v1, under_striped);

    let diff = v1.diff(&striped);
    assert_eq!(diff.len(), 5);
    assert_eq!(diff[0].model, "Expert");
    assert_eq!(diff[0].theirs, Some(vec![1, 6, 11, 16]));
}

#[test]
fn test_samples_drive_plot_distributions() {
    let survey = read_survey(fixture("survey.csv"), true).unwrap();
    let samples = survey.samples.expect("samples requested");
    assert_eq!(samples.len(), SONG_COUNT);

    let map = ModelIndexMap::builtin("v1").unwrap();
    let dists = model_distributions(&samples, &map);
    // 4 songs x 4 respondents per model
    assert!(dists.iter().all(|d| d.samples.len() == 16));
    assert_eq!(dists[1].name, "CP");
    assert_eq!(dists[1].samples.first(), Some(&1.0));
}
