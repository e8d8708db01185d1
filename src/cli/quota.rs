use super::ui;
use crate::aggregator::Aggregator;
use crate::core::quota::QuotaSnapshot;
use anyhow::Result;

fn describe(snapshot: &QuotaSnapshot) -> String {
    let mut output = format!(
        "Remaining checks: {}",
        ui::style_text(
            &format!("{}/{}", snapshot.remaining, snapshot.max_requests),
            if snapshot.remaining > 0 {
                ui::StyleType::TotalValue
            } else {
                ui::StyleType::Error
            }
        )
    );
    output.push_str(&format!(" every {} hours", snapshot.window_hours));
    if let Some(resets_at) = snapshot.resets_at {
        output.push_str(&format!(
            "\nResets at: {}",
            resets_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    output
}

pub async fn run(aggregator: &Aggregator) -> Result<()> {
    let snapshot = aggregator.quota().await?;
    println!("{}", describe(&snapshot));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_describe_quota() {
        let fresh = QuotaSnapshot {
            remaining: 10,
            max_requests: 10,
            window_hours: 24,
            resets_at: None,
        };
        let text = describe(&fresh);
        assert!(text.contains("10/10"));
        assert!(text.contains("every 24 hours"));
        assert!(!text.contains("Resets at"));

        let used = QuotaSnapshot {
            remaining: 0,
            max_requests: 10,
            window_hours: 12,
            resets_at: Some(Utc.with_ymd_and_hms(2025, 6, 16, 10, 0, 0).unwrap()),
        };
        let text = describe(&used);
        assert!(text.contains("0/10"));
        assert!(text.contains("every 12 hours"));
        assert!(text.contains("Resets at: 2025-06-16 10:00:00 UTC"));
    }
}
