//! One-shot CLI commands: shop listing, prompt listing, judging a PNG file

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use scribble_core::economy::shop_item;
use scribble_core::surface::png_data_url;
use scribble_core::{ColorId, ScoreResponse, ScoringGateway};
use std::path::Path;

/// Catalog table with the key that buys or selects each color
pub fn format_shop_table(no_color: bool) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let headers = ["Key", "Color", "Hex", "Cost"];
    if no_color {
        table.set_header(headers.to_vec());
    } else {
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }

    for (i, &color) in ColorId::all().iter().enumerate() {
        let cost = match shop_item(color) {
            Some(item) => item.cost.to_string(),
            None => "free".to_string(),
        };
        let [r, g, b, _] = color.rgba();
        let swatch = if no_color {
            Cell::new(color.name())
        } else {
            Cell::new(color.name()).fg(Color::Rgb { r, g, b })
        };
        table.add_row(Row::from(vec![
            Cell::new(i + 1),
            swatch,
            Cell::new(color.hex()),
            Cell::new(cost),
        ]));
    }

    table.to_string()
}

/// Numbered prompt list
pub fn format_prompt_list(prompts: &[String]) -> String {
    if prompts.is_empty() {
        return "No prompts loaded.".to_string();
    }
    let width = prompts.len().to_string().len();
    prompts
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{:>width$}. {}", i + 1, p, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read a PNG and send it to the judge with `prompt`
pub async fn judge_file<G: ScoringGateway>(
    gateway: &G,
    image: &Path,
    prompt: &str,
) -> Result<ScoreResponse> {
    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;
    if !bytes.starts_with(b"\x89PNG") {
        anyhow::bail!("{} is not a PNG file", image.display());
    }

    let response = gateway
        .score(prompt, &png_data_url(&bytes))
        .await
        .with_context(|| format!("Judging {} failed", image.display()))?;
    Ok(response)
}

/// Human-readable line for a judge answer
pub fn format_judgement(prompt: &str, response: &ScoreResponse) -> String {
    if response.is_scored() {
        format!("{}: {}/100", prompt, response.output)
    } else {
        format!("{}: no score (judge said {:?})", prompt, response.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribble_core::GatewayError;
    use std::io::Write;

    struct EchoJudge;

    impl ScoringGateway for EchoJudge {
        async fn score(&self, prompt: &str, image: &str) -> Result<ScoreResponse, GatewayError> {
            assert!(image.starts_with("data:image/png;base64,"));
            Ok(ScoreResponse {
                output: 70,
                raw: format!("{} looks like 70", prompt),
            })
        }
    }

    #[test]
    fn test_shop_table_lists_catalog() {
        let table = format_shop_table(true);
        assert!(table.contains("White"));
        assert!(table.contains("free"));
        assert!(table.contains("Gold"));
        assert!(table.contains("1000"));
    }

    #[test]
    fn test_prompt_list_numbering() {
        let prompts: Vec<String> = (1..=10).map(|i| format!("P{}", i)).collect();
        let text = format_prompt_list(&prompts);
        assert!(text.starts_with(" 1. P1"));
        assert!(text.ends_with("10. P10"));
    }

    #[test]
    fn test_prompt_list_empty() {
        assert_eq!(format_prompt_list(&[]), "No prompts loaded.");
    }

    #[test]
    fn test_format_judgement() {
        let scored = ScoreResponse {
            output: 42,
            raw: "42".to_string(),
        };
        assert_eq!(format_judgement("Cat", &scored), "Cat: 42/100");

        let unscored = ScoreResponse {
            output: 0,
            raw: "hmm".to_string(),
        };
        assert!(format_judgement("Cat", &unscored).contains("no score"));
    }

    #[tokio::test]
    async fn test_judge_file_rejects_non_png() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"GIF89a").unwrap();

        let err = judge_file(&EchoJudge, file.path(), "Cat").await.unwrap_err();
        assert!(err.to_string().contains("not a PNG"));
    }

    #[tokio::test]
    async fn test_judge_file_sends_data_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x89PNG\r\n\x1a\nrest").unwrap();

        let response = judge_file(&EchoJudge, file.path(), "Cat").await.unwrap();
        assert_eq!(response.output, 70);
        assert_eq!(response.raw, "Cat looks like 70");
    }
}
