use serde::Deserialize;

/// Fund estimate payload wrapped in `jsonpgz(...)`.
///
/// All numbers arrive as strings.
#[derive(Debug, Deserialize)]
pub(crate) struct FundEstimate {
    #[allow(dead_code)]
    pub fundcode: Option<String>,
    pub name: Option<String>,
    /// Last published unit net asset value.
    pub dwjz: Option<String>,
    /// Intraday estimated net asset value.
    pub gsz: Option<String>,
    /// Intraday estimated change in percent.
    pub gszzl: Option<String>,
}
