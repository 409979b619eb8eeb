use serde::{Deserialize, Serialize};

/// 分析结果
///
/// 单份分析返回候选人详情，批量分析返回排名
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Single(CandidateAnalysis),
    Ranking(RankingResult),
}

impl AnalysisResult {
    /// 获取排名（仅批量结果）
    pub fn ranking(&self) -> Option<&[CandidateScore]> {
        match self {
            AnalysisResult::Ranking(r) => Some(&r.ranking),
            AnalysisResult::Single(_) => None,
        }
    }
}

/// 单份简历的分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAnalysis {
    #[serde(alias = "nombre", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(alias = "telefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(alias = "puntaje", deserialize_with = "deserialize_score")]
    pub score: u8,
    #[serde(alias = "fortalezas", default, deserialize_with = "null_as_default")]
    pub strengths: Vec<String>,
    #[serde(alias = "mejoras", default, deserialize_with = "null_as_default")]
    pub improvements: Vec<String>,
}

/// 批量分析的排名结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub ranking: Vec<CandidateScore>,
    #[serde(alias = "conclusion_global", default, deserialize_with = "null_as_default")]
    pub conclusion: String,
}

/// 排名中的单个候选人
///
/// 字段名与后端保持一致，导出时原样回传
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    #[serde(rename = "nombre", alias = "name", default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "puntaje", alias = "score", deserialize_with = "deserialize_score")]
    pub score: u8,
    #[serde(rename = "ajuste", alias = "fit", default)]
    pub fit: FitLabel,
    #[serde(rename = "razon_si", alias = "reason_for", default, deserialize_with = "null_as_default")]
    pub reason_for: String,
    #[serde(rename = "razon_no", alias = "reason_against", default, deserialize_with = "null_as_default")]
    pub reason_against: String,
}

/// 匹配度标签
///
/// 与已知集合做大小写敏感的比较，未知标签原样保留
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FitLabel {
    Excellent,
    Good,
    Fair,
    Other(String),
    #[default]
    Unspecified,
}

impl FitLabel {
    /// 从后端返回的原始文本解析
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Excelente" | "Excellent" => FitLabel::Excellent,
            "Bueno" | "Good" => FitLabel::Good,
            "Regular" | "Fair" => FitLabel::Fair,
            "" => FitLabel::Unspecified,
            other => FitLabel::Other(other.to_string()),
        }
    }

    /// 展示文本（未知标签原样返回）
    pub fn as_str(&self) -> &str {
        match self {
            FitLabel::Excellent => "Excelente",
            FitLabel::Good => "Bueno",
            FitLabel::Fair => "Regular",
            FitLabel::Other(raw) => raw,
            FitLabel::Unspecified => "",
        }
    }

    /// 小写的样式键
    pub fn display_key(&self) -> String {
        self.as_str().to_lowercase()
    }
}

impl std::fmt::Display for FitLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FitLabel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FitLabel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| FitLabel::parse(&s)).unwrap_or_default())
    }
}

// 后端可能用 null 表示空字段，按缺省值处理
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// 分数可能以整数、小数或字符串的形式返回，统一收敛到 0..=100
fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct ScoreVisitor;

    impl<'de> Visitor<'de> for ScoreVisitor {
        type Value = u8;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or numeric string between 0 and 100")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.clamp(0, 100) as u8)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.min(100) as u8)
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if value.is_nan() {
                return Err(E::custom("score is NaN"));
            }
            Ok(value.round().clamp(0.0, 100.0) as u8)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            let parsed: f64 = value
                .trim()
                .trim_end_matches("/100")
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid score: {}", value)))?;
            self.visit_f64(parsed)
        }
    }

    deserializer.deserialize_any(ScoreVisitor)
}
