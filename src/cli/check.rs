use super::ui;
use crate::aggregator::Aggregator;
use crate::core::category::fields;
use crate::core::{AggregateResult, FieldValue, MetricCategory};
use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use std::collections::BTreeSet;

impl AggregateResult {
    pub fn display_as_table(&self, redirect_cap: Option<usize>) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);

        for category in &self.categories {
            match category {
                MetricCategory::RedirectedDomains => {
                    self.add_redirect_rows(&mut table, redirect_cap);
                }
                _ => {
                    table.add_row(vec![Cell::new(category.label()), self.category_cell(*category)]);
                }
            }
        }

        let mut output = format!(
            "Domain: {}\n\n",
            ui::style_text(self.domain.as_str(), ui::StyleType::Title)
        );
        output.push_str(&table.to_string());
        output
    }

    fn category_cell(&self, category: MetricCategory) -> Cell {
        let values: Vec<&FieldValue> = match category {
            // Total days is kept for machine output only
            MetricCategory::DomainAge => self.get(fields::DOMAIN_AGE).into_iter().collect(),
            _ => self.values_for(category),
        };

        if values.is_empty() || !values.iter().any(|v| v.is_available()) {
            return ui::field_cell(&FieldValue::Unavailable);
        }

        let text = values
            .iter()
            .map(|value| match (category, value) {
                (MetricCategory::EstimatedValue, FieldValue::Text(amount)) => format!("${amount}"),
                _ => value.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" & ");
        ui::value_cell(text, true)
    }

    fn add_redirect_rows(&self, table: &mut Table, redirect_cap: Option<usize>) {
        let label = MetricCategory::RedirectedDomains.label();
        match self.get(fields::REDIRECT_CHAIN) {
            Some(FieldValue::Chain(domains)) if !domains.is_empty() => {
                let shown = redirect_cap.unwrap_or(domains.len()).min(domains.len());
                for (i, domain) in domains.iter().take(shown).enumerate() {
                    let row_label = if i == 0 { label } else { "" };
                    table.add_row(vec![Cell::new(row_label), ui::value_cell(domain.clone(), true)]);
                }
                if shown < domains.len() {
                    table.add_row(vec![
                        Cell::new(""),
                        ui::value_cell(
                            ui::style_text(
                                &format!("... {} more", domains.len() - shown),
                                ui::StyleType::Subtle,
                            ),
                            true,
                        ),
                    ]);
                }
            }
            Some(FieldValue::Chain(_)) => {
                table.add_row(vec![Cell::new(label), ui::value_cell("None".to_string(), true)]);
            }
            other => {
                table.add_row(vec![
                    Cell::new(label),
                    ui::field_cell(other.unwrap_or(&FieldValue::Unavailable)),
                ]);
            }
        }

        let total = self
            .get(fields::REDIRECT_TOTAL)
            .unwrap_or(&FieldValue::Unavailable);
        table.add_row(vec![
            Cell::new(ui::style_text("Total Redirects", ui::StyleType::TotalLabel)),
            ui::field_cell(total),
        ]);
    }
}

/// Renders an aggregate either as a table or as pretty JSON.
pub fn render(result: &AggregateResult, json: bool, redirect_cap: Option<usize>) -> Result<String> {
    if json {
        serde_json::to_string_pretty(result).context("Failed to serialize result")
    } else {
        Ok(result.display_as_table(redirect_cap))
    }
}

pub async fn run(
    aggregator: &Aggregator,
    domain: &str,
    categories: &BTreeSet<MetricCategory>,
    json: bool,
    redirect_cap: Option<usize>,
) -> Result<()> {
    let pb = ui::new_spinner(format!("Fetching metrics for {domain}..."));
    let result = aggregator.aggregate(domain, categories).await;
    pb.finish_and_clear();

    let result = result?;
    println!("{}", render(&result, json, redirect_cap)?);

    if !json {
        let quota = aggregator.quota().await?;
        println!(
            "\n{}",
            ui::style_text(
                &format!(
                    "{} of {} checks remaining",
                    quota.remaining, quota.max_requests
                ),
                ui::StyleType::Subtle
            )
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DomainKey;
    use crate::core::derive::DomainAge;
    use std::collections::BTreeMap;

    fn result(categories: &[MetricCategory], values: Vec<(&'static str, FieldValue)>) -> AggregateResult {
        AggregateResult {
            domain: DomainKey::new("example.com"),
            categories: categories.to_vec(),
            fields: values.into_iter().collect::<BTreeMap<_, _>>(),
            fetched: Vec::new(),
        }
    }

    #[test]
    fn test_table_joins_multi_field_categories() {
        let result = result(
            &[MetricCategory::AuthorityScores, MetricCategory::EstimatedValue],
            vec![
                (fields::AUTHORITY_SCORE, FieldValue::Count(45)),
                (fields::PAGE_AUTHORITY, FieldValue::Count(38)),
                (fields::ESTIMATED_VALUE_USD, FieldValue::Text("12,345".to_string())),
            ],
        );

        let table = result.display_as_table(None);
        assert!(table.contains("DA & PA"));
        assert!(table.contains("45 & 38"));
        assert!(table.contains("$12,345"));
    }

    #[test]
    fn test_table_shows_unavailable_values() {
        let result = result(
            &[MetricCategory::EstimatedValue, MetricCategory::DomainAge],
            vec![
                (fields::ESTIMATED_VALUE_USD, FieldValue::Unavailable),
                (
                    fields::DOMAIN_AGE,
                    FieldValue::Age(DomainAge {
                        years: 1,
                        months: 1,
                        days: 5,
                        total_days: 400,
                    }),
                ),
                (fields::DOMAIN_AGE_DAYS, FieldValue::Count(400)),
            ],
        );

        let table = result.display_as_table(None);
        assert!(table.contains("Not Available"));
        assert!(!table.contains("$Not Available"));
        assert!(table.contains("1 Years 1 Months 5 Days"));
        assert!(!table.contains("& 400"));
    }

    #[test]
    fn test_redirect_cap_only_limits_rows() {
        let chain = (1..=5).map(|i| format!("r{i}.com")).collect::<Vec<_>>();
        let result = result(
            &[MetricCategory::RedirectedDomains],
            vec![
                (fields::REDIRECT_CHAIN, FieldValue::Chain(chain)),
                (fields::REDIRECT_TOTAL, FieldValue::Count(1234)),
            ],
        );

        let table = result.display_as_table(Some(2));
        assert!(table.contains("r1.com"));
        assert!(table.contains("r2.com"));
        assert!(!table.contains("r3.com"));
        assert!(table.contains("3 more"));
        assert!(table.contains("1,234"));

        let uncapped = result.display_as_table(None);
        assert!(uncapped.contains("r5.com"));
    }

    #[test]
    fn test_render_json() {
        let result = result(
            &[MetricCategory::DropHistory],
            vec![(fields::DROP_COUNT, FieldValue::Count(2))],
        );

        let json = render(&result, true, None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["domain"], "example.com");
        assert_eq!(value["fields"]["dropCount"], 2);
    }
}
