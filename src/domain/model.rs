use crate::utils::error::{ComparisonError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MIN_FUNDS: usize = 2;
pub const MAX_FUNDS: usize = 4;

pub const NOT_SPECIFIED: &str = "Not specified";

/// 2 到 4 個基金名稱，順序決定 A/B/C/D 標籤
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FundList(Vec<String>);

impl FundList {
    /// 連續空白（含換行）壓成單一空格，去除空白項目後驗證數量
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let funds: Vec<String> = names
            .into_iter()
            .map(|name| name.as_ref().split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|name| !name.is_empty())
            .collect();

        // 每個名稱在 prompt 中必須剛好佔一行
        if funds.iter().any(|name| name.chars().any(char::is_control)) {
            return Err(ComparisonError::invalid_input(
                "Fund names must not contain control characters",
            ));
        }

        if funds.len() < MIN_FUNDS {
            return Err(ComparisonError::invalid_input(
                "At least 2 fund names are required",
            ));
        }
        if funds.len() > MAX_FUNDS {
            return Err(ComparisonError::invalid_input(
                "At most 4 fund names are supported",
            ));
        }

        Ok(Self(funds))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// (label, name) pairs: ('A', first), ('B', second), ...
    pub fn labeled(&self) -> impl Iterator<Item = (char, &str)> {
        self.0
            .iter()
            .enumerate()
            .map(|(index, name)| ((b'A' + index as u8) as char, name.as_str()))
    }
}

/// The ten questionnaire dimensions, declared in prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceKey {
    TimeHorizon,
    RiskAppetite,
    ReturnsVsStability,
    TaxSensitivity,
    LiquidityNeeds,
    PastReturnsPreference,
    FundAgeBias,
    FundSizePreference,
    FundManagerExperience,
    VolatilityTolerance,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 10] = [
        PreferenceKey::TimeHorizon,
        PreferenceKey::RiskAppetite,
        PreferenceKey::ReturnsVsStability,
        PreferenceKey::TaxSensitivity,
        PreferenceKey::LiquidityNeeds,
        PreferenceKey::PastReturnsPreference,
        PreferenceKey::FundAgeBias,
        PreferenceKey::FundSizePreference,
        PreferenceKey::FundManagerExperience,
        PreferenceKey::VolatilityTolerance,
    ];

    /// Wire name used by the questionnaire payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimeHorizon => "time_horizon",
            Self::RiskAppetite => "risk_appetite",
            Self::ReturnsVsStability => "returns_vs_stability",
            Self::TaxSensitivity => "tax_sensitivity",
            Self::LiquidityNeeds => "liquidity_needs",
            Self::PastReturnsPreference => "past_returns_preference",
            Self::FundAgeBias => "fund_age_bias",
            Self::FundSizePreference => "fund_size_preference",
            Self::FundManagerExperience => "fund_manager_experience",
            Self::VolatilityTolerance => "volatility_tolerance",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::TimeHorizon => "Investment Time Horizon",
            Self::RiskAppetite => "Risk Appetite",
            Self::ReturnsVsStability => "Return vs Stability Preference (0–100)",
            Self::TaxSensitivity => "Tax Sensitivity",
            Self::LiquidityNeeds => "Liquidity Needs",
            Self::PastReturnsPreference => "Preference on Return Consistency",
            Self::FundAgeBias => "Fund Age Preference",
            Self::FundSizePreference => "AUM Size Preference",
            Self::FundManagerExperience => "Importance of Fund Manager Experience",
            Self::VolatilityTolerance => "Volatility Tolerance",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

/// 問卷答案，值不做任何範圍檢查，原樣帶入 prompt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceSet {
    values: BTreeMap<String, serde_json::Value>,
}

impl PreferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: PreferenceKey, value: impl Into<serde_json::Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: PreferenceKey, value: impl Into<serde_json::Value>) {
        self.values.insert(key.as_str().to_string(), value.into());
    }

    pub fn get(&self, key: PreferenceKey) -> Option<&serde_json::Value> {
        self.values.get(key.as_str())
    }

    /// 只有缺少、null 或空字串才顯示 "Not specified"，數字 0 照樣輸出
    pub fn render(&self, key: PreferenceKey) -> String {
        match self.get(key) {
            None | Some(serde_json::Value::Null) => NOT_SPECIFIED.to_string(),
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => {
                NOT_SPECIFIED.to_string()
            }
            // 與基金名稱相同：每個偏好只佔一行
            Some(serde_json::Value::String(s)) => s.split_whitespace().collect::<Vec<_>>().join(" "),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(serde_json::Value::Bool(b)) => b.to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// 經過驗證的比較請求
#[derive(Debug, Clone)]
pub struct ComparisonRequest {
    pub funds: FundList,
    pub preferences: PreferenceSet,
}

/// Inbound body of `POST /api/compare-funds`.
///
/// `funds` is the ordered array form. The positional `fund1`..`fund4` fields are
/// still accepted and only consulted when `funds` is absent.
/// Fund entries may be strings or numbers; `null` counts as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompareFundsPayload {
    #[serde(default)]
    pub funds: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub fund1: Option<serde_json::Value>,
    #[serde(default)]
    pub fund2: Option<serde_json::Value>,
    #[serde(default)]
    pub fund3: Option<serde_json::Value>,
    #[serde(default)]
    pub fund4: Option<serde_json::Value>,
    #[serde(default)]
    pub preferences: Option<PreferenceSet>,
}

impl CompareFundsPayload {
    pub fn into_request(self) -> Result<ComparisonRequest> {
        let entries = match self.funds {
            Some(list) => list,
            None => [self.fund1, self.fund2, self.fund3, self.fund4]
                .into_iter()
                .flatten()
                .collect(),
        };

        let names = entries
            .into_iter()
            .filter_map(|entry| fund_name(entry).transpose())
            .collect::<Result<Vec<_>>>()?;
        let funds = FundList::new(names)?;

        Ok(ComparisonRequest {
            funds,
            preferences: self.preferences.unwrap_or_default(),
        })
    }
}

fn fund_name(entry: serde_json::Value) -> Result<Option<String>> {
    match entry {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(ComparisonError::invalid_input(format!(
            "Fund names must be strings or numbers, got {}",
            other
        ))),
    }
}

/// 上游回覆整理後的結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub comparison_text: String,
    pub model_name: String,
    pub usage_stats: serde_json::Value,
}
