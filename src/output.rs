//! Terminal rendering for command results.

use crate::cache::AudioLayout;
use crate::pipeline::RunSummary;
use crate::segment::SegmentedSentence;
use crate::tts::VoiceProfile;
use owo_colors::OwoColorize;
use std::time::Duration;

/// Render a run summary: the tally line, then one line per item failure.
pub fn format_summary(summary: &RunSummary, elapsed: Duration, color: bool) -> String {
    let elapsed = humantime::format_duration(Duration::from_secs(elapsed.as_secs()));
    let tally = summary.to_string();
    let mut lines = Vec::with_capacity(summary.failures.len() + 2);

    lines.push(if !color {
        format!("{tally} in {elapsed}")
    } else if summary.is_clean() {
        format!("{} {}", tally.green(), format!("in {elapsed}").dimmed())
    } else {
        format!("{} {}", tally.yellow(), format!("in {elapsed}").dimmed())
    });

    for failure in &summary.failures {
        lines.push(if color {
            format!("  {} {}", "✗".red(), failure)
        } else {
            format!("  ✗ {failure}")
        });
    }

    if summary.jobs_failed > 0 {
        let note = format!(
            "{} batch job(s) failed; see the log above and re-run to retry",
            summary.jobs_failed
        );
        lines.push(if color { note.red().to_string() } else { note });
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Render a segmented sentence as the text line over the romanization line.
pub fn format_segmented(sentence: &SegmentedSentence) -> String {
    format!("{}\n{}\n", sentence.text(), sentence.romanization_line())
}

/// Render configured voice profiles and where their audio lives.
pub fn format_voices(voices: &[VoiceProfile], layout: &AudioLayout, color: bool) -> String {
    voices
        .iter()
        .map(|profile| {
            let dir = layout.profile_dir(&profile.name);
            if color {
                format!(
                    "{} {}  {}\n",
                    "●".green(),
                    profile.name.bold(),
                    format!("{}  {}", profile.voice, dir.display()).dimmed()
                )
            } else {
                format!("{}  {}  {}\n", profile.name, profile.voice, dir.display())
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Role;
    use crate::error::SynthesisError;
    use crate::segment::{SegmentedChar, SegmentedSentence};

    #[test]
    fn plain_summary_lists_failures() {
        let summary = RunSummary {
            records: 10,
            produced: 1,
            failures: vec![SynthesisError::new(Role::Word, 5, "male", "HTTP 429")],
            ..RunSummary::default()
        };

        let text = format_summary(&summary, Duration::from_secs(3), false);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "10 records, 1 batches produced, 0 skipped, 0 empty, 1 item failures in 3s"
        );
        assert_eq!(lines[1], "  ✗ word 005 (male): HTTP 429");
    }

    #[test]
    fn summary_mentions_failed_jobs() {
        let summary = RunSummary {
            jobs_failed: 2,
            ..RunSummary::default()
        };
        let text = format_summary(&summary, Duration::ZERO, false);
        assert!(text.contains("2 batch job(s) failed"));
    }

    #[test]
    fn segmented_prints_two_lines() {
        let sentence = SegmentedSentence {
            pairs: vec![
                SegmentedChar {
                    character: "好".to_string(),
                    romanization: "hou2".to_string(),
                },
                SegmentedChar {
                    character: "！".to_string(),
                    romanization: " ".to_string(),
                },
            ],
        };
        assert_eq!(format_segmented(&sentence), "好！\nhou2  \n");
    }

    #[test]
    fn voices_plain_listing() {
        let voices = vec![VoiceProfile::new("male", "zh-HK-WanLungNeural")];
        let layout = AudioLayout::new("audio", true, "mp3");
        let text = format_voices(&voices, &layout, false);
        assert_eq!(text, "male  zh-HK-WanLungNeural  audio/male\n");
    }

    #[test]
    fn voices_share_root_in_single_profile_layout() {
        let voices = vec![VoiceProfile::new("male", "zh-HK-WanLungNeural")];
        let layout = AudioLayout::new("audio", false, "mp3");
        assert_eq!(
            format_voices(&voices, &layout, false),
            "male  zh-HK-WanLungNeural  audio\n"
        );
    }
}
