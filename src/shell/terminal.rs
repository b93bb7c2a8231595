//! One-shot review from the command line.

use crate::error::LitrevError;
use crate::models::{Frame, Paper, ReviewRequest};
use crate::pipeline;
use crate::team::RoundRobinTeam;
use anyhow::Result;
use futures::{Stream, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;

fn spinner(show: bool) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message("Working...");
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

/// Run a review and print each frame as it arrives.
pub async fn run(team: &RoundRobinTeam, request: &ReviewRequest, show_progress: bool) -> Result<()> {
    let frames = pipeline::run_review(team, request);
    let progress = spinner(show_progress);
    let mut stdout = std::io::stdout();

    let outcome = render(frames, &mut stdout, progress.as_ref()).await;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    outcome?;

    println!("✅ Review completed!");
    Ok(())
}

/// Write frames to `out` until the stream ends or yields an error.
pub async fn render<S, W>(
    frames: S,
    out: &mut W,
    progress: Option<&ProgressBar>,
) -> std::result::Result<usize, LitrevError>
where
    S: Stream<Item = crate::error::Result<Frame>>,
    W: Write,
{
    futures::pin_mut!(frames);
    let mut count = 0;

    while let Some(item) = frames.next().await {
        let frame = item?;
        let line = format!("{}\n", frame);
        let written = match progress {
            Some(pb) => pb.suspend(|| out.write_all(line.as_bytes())),
            None => out.write_all(line.as_bytes()),
        };
        written.map_err(|e| LitrevError::Runtime(format!("Failed to write output: {}", e)))?;
        count += 1;
    }

    Ok(count)
}

/// Print the candidates a dry run found.
pub fn print_papers<W: Write>(papers: &[Paper], out: &mut W) -> std::io::Result<()> {
    if papers.is_empty() {
        writeln!(out, "   No papers found.")?;
        return Ok(());
    }

    writeln!(out, "   Found {} candidate papers:\n", papers.len())?;
    for (i, paper) in papers.iter().enumerate() {
        writeln!(out, "   {:>2}. {} ({})", i + 1, paper.title, paper.published)?;
        writeln!(out, "       {}", paper.authors.join(", "))?;
        writeln!(out, "       {}", paper.pdf_url)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_papers;
    use futures::stream;

    #[tokio::test]
    async fn test_render_prints_frames_in_order() {
        let frames = stream::iter(vec![
            Ok(Frame::task("review gnn")),
            Ok(Frame::new("search_agent", "[...]")),
            Ok(Frame::new("summarizer_agent", "# Review")),
        ]);
        let mut out = Vec::new();

        let count = render(frames, &mut out, None).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "user: review gnn\nsearch_agent: [...]\nsummarizer_agent: # Review\n"
        );
    }

    #[tokio::test]
    async fn test_render_stops_on_error() {
        let frames = stream::iter(vec![
            Ok(Frame::task("review gnn")),
            Err(LitrevError::Search("timed out".to_string())),
            Ok(Frame::new("summarizer_agent", "unreachable")),
        ]);
        let mut out = Vec::new();

        let err = render(frames, &mut out, None).await.unwrap_err();
        assert!(matches!(err, LitrevError::Search(_)));
        assert_eq!(String::from_utf8(out).unwrap(), "user: review gnn\n");
    }

    #[test]
    fn test_print_papers() {
        let mut out = Vec::new();
        print_papers(&sample_papers(2), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Found 2 candidate papers"));
        assert!(text.contains(" 1. Graph Paper 1 (2020-01-01)"));
        assert!(text.contains("http://arxiv.org/pdf/2001.00002v1"));
    }

    #[test]
    fn test_print_no_papers() {
        let mut out = Vec::new();
        print_papers(&[], &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("No papers found."));
    }
}
