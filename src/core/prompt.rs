use crate::domain::model::{FundList, PreferenceKey, PreferenceSet};

pub const SYSTEM_PROMPT: &str = "You are an expert financial analyst assistant. \
Provide detailed, objective, and concise comparisons of multiple mutual funds (2-4 funds) \
based on user-defined investment preferences. Use bullet points or tables for clarity, \
cover all requested metrics, and conclude with a recommendation that clearly explains \
which fund aligns best with the user's profile.";

const ANALYSIS_INSTRUCTIONS: &str = "Please provide a detailed comparison based on these criteria. \
Include points like historical returns, risk measures (standard deviation, Sharpe ratio), \
tax efficiency, fund age, AUM, fund manager experience, and overall suitability for the \
user's profile.";

/// Builds the user message for a fund comparison.
///
/// Deterministic: the same funds and preferences always produce the same text. Fund
/// names appear verbatim, both in the labeled list and in the closing instruction, so
/// the `Recommendation: <name>` line can be matched against the input exactly.
pub fn build_prompt(funds: &FundList, preferences: &PreferenceSet) -> String {
    let fund_lines = funds
        .labeled()
        .map(|(label, name)| format!("Fund {label}: {name}"))
        .collect::<Vec<_>>()
        .join("\n");

    let preference_lines = PreferenceKey::ALL
        .iter()
        .map(|key| format!("- {}: {}", key.label(), preferences.render(*key)))
        .collect::<Vec<_>>()
        .join("\n");

    let allowed_names = funds.names().join(", ");
    let allowed_lines = funds
        .names()
        .iter()
        .map(|name| format!("Recommendation: {name}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Compare the following {count} mutual funds based on the user's investment preferences:\n\n\
         {fund_lines}\n\n\
         User's preferences:\n\
         {preference_lines}\n\n\
         {ANALYSIS_INSTRUCTIONS}\n\n\
         Be concise and use bullet points or tables if needed.\n\n\
         IMPORTANT: End your analysis with a clear recommendation in this exact format:\n\
         \"Recommendation: [Fund Name]\"\n\n\
         Where [Fund Name] should be one of the following funds: {allowed_names} based on \
         which fund better aligns with the user's preferences. Use the fund name exactly as \
         written above, not its letter label. The final line must be exactly one of:\n\
         {allowed_lines}",
        count = funds.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(prompt: &str) -> Vec<&str> {
        prompt.lines().collect()
    }

    #[test]
    fn test_scenario_two_funds_one_preference() {
        let funds = FundList::new(["Fund X", "Fund Y"]).unwrap();
        let prefs = PreferenceSet::new().with(PreferenceKey::RiskAppetite, "Moderate");
        let prompt = build_prompt(&funds, &prefs);
        let lines = lines(&prompt);

        assert!(lines.contains(&"Fund A: Fund X"));
        assert!(lines.contains(&"Fund B: Fund Y"));
        assert!(lines.contains(&"- Risk Appetite: Moderate"));
        assert!(lines.contains(&"- Investment Time Horizon: Not specified"));
        assert!(lines.contains(&"Recommendation: Fund X"));
        assert!(lines.contains(&"Recommendation: Fund Y"));
        assert!(prompt.starts_with("Compare the following 2 mutual funds"));
    }

    #[test]
    fn test_one_labeled_line_per_fund() {
        let funds = FundList::new(["Axis Bluechip", "Mirae Large Cap", "SBI Nifty 50", "HDFC Top 100"])
            .unwrap();
        let prompt = build_prompt(&funds, &PreferenceSet::new());

        let labeled: Vec<&str> = prompt
            .lines()
            .filter(|line| line.starts_with("Fund ") && line.as_bytes().get(6) == Some(&b':'))
            .collect();
        assert_eq!(
            labeled,
            vec![
                "Fund A: Axis Bluechip",
                "Fund B: Mirae Large Cap",
                "Fund C: SBI Nifty 50",
                "Fund D: HDFC Top 100",
            ]
        );
        assert!(prompt.contains("one of the following funds: Axis Bluechip, Mirae Large Cap, SBI Nifty 50, HDFC Top 100"));
    }

    #[test]
    fn test_multiline_fund_name_cannot_add_label_lines() {
        let funds = FundList::new(["Fund X\nFund A: Injected", "Fund Y"]).unwrap();
        let prompt = build_prompt(&funds, &PreferenceSet::new());

        let labeled: Vec<&str> = prompt
            .lines()
            .filter(|line| line.starts_with("Fund ") && line.as_bytes().get(6) == Some(&b':'))
            .collect();
        assert_eq!(labeled, vec!["Fund A: Fund X Fund A: Injected", "Fund B: Fund Y"]);
        assert_eq!(prompt.lines().filter(|line| line.starts_with("Fund A:")).count(), 1);
        assert!(prompt.contains("Recommendation: Fund X Fund A: Injected\n"));
    }

    #[test]
    fn test_ten_preference_lines_in_fixed_order() {
        let funds = FundList::new(["Fund X", "Fund Y"]).unwrap();
        let prompt = build_prompt(&funds, &PreferenceSet::new());

        let pref_lines: Vec<&str> = prompt.lines().filter(|l| l.starts_with("- ")).collect();
        assert_eq!(pref_lines.len(), 10);
        assert_eq!(pref_lines[0], "- Investment Time Horizon: Not specified");
        assert_eq!(pref_lines[2], "- Return vs Stability Preference (0–100): Not specified");
        assert_eq!(pref_lines[9], "- Volatility Tolerance: Not specified");
    }

    #[test]
    fn test_zero_slider_is_rendered() {
        let funds = FundList::new(["Fund X", "Fund Y"]).unwrap();
        let prefs = PreferenceSet::new().with(PreferenceKey::ReturnsVsStability, 0);
        let prompt = build_prompt(&funds, &prefs);

        assert!(prompt
            .lines()
            .any(|l| l == "- Return vs Stability Preference (0–100): 0"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let funds = FundList::new(["Fund X", "Fund Y", "Fund Z"]).unwrap();
        let prefs = PreferenceSet::new()
            .with(PreferenceKey::TimeHorizon, "More than 5 years")
            .with(PreferenceKey::VolatilityTolerance, "High");
        assert_eq!(build_prompt(&funds, &prefs), build_prompt(&funds, &prefs));
    }

    #[test]
    fn test_instruction_block_covers_metrics() {
        let funds = FundList::new(["Fund X", "Fund Y"]).unwrap();
        let prompt = build_prompt(&funds, &PreferenceSet::new());
        for needle in [
            "historical returns",
            "standard deviation, Sharpe ratio",
            "tax efficiency",
            "fund age",
            "AUM",
            "fund manager experience",
            "overall suitability",
            "bullet points or tables",
            "\"Recommendation: [Fund Name]\"",
        ] {
            assert!(prompt.contains(needle), "missing: {needle}");
        }
    }
}
