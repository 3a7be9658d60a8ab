//! Domain error types.

/// Top-level error type for stockwatch.
#[derive(Debug, thiserror::Error)]
pub enum StockwatchError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no price data for {ticker}")]
    NoData { ticker: String },

    #[error("invalid price series: {reason}")]
    InvalidSeries { reason: String },

    #[error("malformed recommendation for {ticker}: missing {field}")]
    MalformedRecommendation { ticker: String, field: String },

    #[error("archive error in {path}: {reason}")]
    Archive { path: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&StockwatchError> for std::process::ExitCode {
    fn from(err: &StockwatchError) -> Self {
        let code: u8 = match err {
            StockwatchError::Io(_) | StockwatchError::Archive { .. } => 1,
            StockwatchError::ConfigParse { .. }
            | StockwatchError::ConfigMissing { .. }
            | StockwatchError::ConfigInvalid { .. } => 2,
            StockwatchError::DataSource { .. } => 3,
            StockwatchError::NoData { .. } | StockwatchError::InvalidSeries { .. } => 5,
            StockwatchError::MalformedRecommendation { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = StockwatchError::NoData {
            ticker: "SBER".into(),
        };
        assert_eq!(err.to_string(), "no price data for SBER");

        let err = StockwatchError::MalformedRecommendation {
            ticker: "GAZP".into(),
            field: "stop_loss".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed recommendation for GAZP: missing stop_loss"
        );
    }

    #[test]
    fn io_converts_transparently() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StockwatchError = io.into();
        assert_eq!(err.to_string(), "gone");
    }

    #[test]
    fn exit_codes_by_category() {
        use std::process::ExitCode;
        let code = |err: StockwatchError| ExitCode::from(&err);

        assert_eq!(
            code(std::io::Error::other("disk").into()),
            ExitCode::from(1)
        );
        assert_eq!(
            code(StockwatchError::Archive {
                path: "a.json".into(),
                reason: "bad".into()
            }),
            ExitCode::from(1)
        );
        assert_eq!(
            code(StockwatchError::ConfigMissing {
                section: "watchlist".into(),
                key: "tickers".into()
            }),
            ExitCode::from(2)
        );
        assert_eq!(
            code(StockwatchError::DataSource {
                reason: "bad csv".into()
            }),
            ExitCode::from(3)
        );
        assert_eq!(
            code(StockwatchError::NoData {
                ticker: "SBER".into()
            }),
            ExitCode::from(5)
        );
        assert_eq!(
            code(StockwatchError::InvalidSeries {
                reason: "duplicate date".into()
            }),
            ExitCode::from(5)
        );
        assert_eq!(
            code(StockwatchError::MalformedRecommendation {
                ticker: "GAZP".into(),
                field: "target1".into()
            }),
            ExitCode::from(6)
        );
    }
}
