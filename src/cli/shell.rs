use super::{check, selection, ui};
use crate::aggregator::Aggregator;
use crate::core::MetricCategory;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

#[derive(Debug, PartialEq, Eq)]
enum Line {
    Empty,
    Quit,
    Check {
        domain: String,
        categories: BTreeSet<MetricCategory>,
    },
}

/// Parses `<domain> [category...]`. No categories selects all of them.
fn parse_line(line: &str) -> Result<Line> {
    let mut tokens = line.split_whitespace();
    let Some(domain) = tokens.next() else {
        return Ok(Line::Empty);
    };
    if matches!(domain, "quit" | "exit") {
        return Ok(Line::Quit);
    }

    let categories = tokens
        .map(str::parse::<MetricCategory>)
        .collect::<Result<Vec<MetricCategory>>>()?;
    Ok(Line::Check {
        domain: domain.to_string(),
        categories: selection(&categories),
    })
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush().context("Failed to flush stdout")
}

/// Interactive session over stdin. All lines share one aggregator, so
/// refining the selection for the same domain reuses cached data.
pub async fn run(aggregator: &Aggregator, redirect_cap: Option<usize>) -> Result<()> {
    println!(
        "{}",
        ui::style_text(
            "Enter a domain followed by optional categories, or 'quit' to exit",
            ui::StyleType::Subtle
        )
    );
    run_lines(aggregator, BufReader::new(tokio::io::stdin()), redirect_cap).await
}

pub async fn run_lines<R>(aggregator: &Aggregator, reader: R, redirect_cap: Option<usize>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        match parse_line(&line) {
            Ok(Line::Empty) => continue,
            Ok(Line::Quit) => break,
            Ok(Line::Check { domain, categories }) => {
                if let Err(e) = check::run(aggregator, &domain, &categories, false, redirect_cap).await {
                    debug!("Check for {} failed: {:#}", domain, e);
                    println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
                }
            }
            Err(e) => println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error)),
        }
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("   ").unwrap(), Line::Empty);
        assert_eq!(parse_line("exit").unwrap(), Line::Quit);

        let all = parse_line("example.com").unwrap();
        assert_eq!(
            all,
            Line::Check {
                domain: "example.com".to_string(),
                categories: MetricCategory::ALL.into_iter().collect(),
            }
        );

        let some = parse_line("example.com age drops age").unwrap();
        assert_eq!(
            some,
            Line::Check {
                domain: "example.com".to_string(),
                categories: [MetricCategory::DomainAge, MetricCategory::DropHistory]
                    .into_iter()
                    .collect(),
            }
        );

        assert!(parse_line("example.com nonsense").is_err());
    }
}
