use super::AppState;
use crate::application::forecast::Forecast;
use crate::domain::errors::ForecastError;
use crate::domain::market::PriceBar;
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Value, json};
use std::time::Instant;
use tracing::{error, info, warn};

/// RFC 7231 date, the format browsers and `new Date()` parse natively
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

fn serialize_http_date<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format(HTTP_DATE_FORMAT))
}

/// One row of `ohlc_data`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OhlcRecord {
    #[serde(serialize_with = "serialize_http_date")]
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl From<PriceBar> for OhlcRecord {
    fn from(bar: PriceBar) -> Self {
        Self {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastResponse {
    pub ticker: String,
    pub company_name: String,
    pub ohlc_data: Vec<OhlcRecord>,
    pub predicted_prices: Vec<f64>,
}

impl From<Forecast> for ForecastResponse {
    fn from(forecast: Forecast) -> Self {
        Self {
            ticker: forecast.ticker,
            company_name: forecast.company_name,
            ohlc_data: forecast.bars.into_iter().map(OhlcRecord::from).collect(),
            predicted_prices: forecast.predicted_prices,
        }
    }
}

/// `{"error": ...}` response with its status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    outcome: &'static str,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            outcome: "bad_request",
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::ModelNotLoaded => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: err.to_string(),
                outcome: "model_not_loaded",
            },
            ForecastError::MissingTicker => Self::bad_request(err.to_string()),
            ForecastError::NoData { .. } => Self {
                status: StatusCode::NOT_FOUND,
                message: err.to_string(),
                outcome: "not_found",
            },
            other => {
                let detail = other.to_string();
                let quoted = serde_json::to_string(&detail).unwrap_or_else(|_| format!("\"{}\"", detail));
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: format!("An error occurred: {}", quoted),
                    outcome: "error",
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// POST /predict - forecast the next closes for `{"ticker": ...}`.
///
/// The body is read as JSON whatever its Content-Type.
pub async fn predict_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let started = Instant::now();
    let result = predict(&state, &body).await;
    let latency = started.elapsed().as_secs_f64();

    match result {
        Ok(response) => {
            state.metrics.record_forecast("ok", latency);
            info!(
                "Served forecast for {} ({} bars, {:.3}s)",
                response.ticker,
                response.ohlc_data.len(),
                latency
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => {
            state.metrics.record_forecast(err.outcome, latency);
            if err.status.is_server_error() {
                error!("Forecast failed ({}): {}", err.status, err.message);
            } else {
                warn!("Forecast rejected ({}): {}", err.status, err.message);
            }
            err.into_response()
        }
    }
}

async fn predict(state: &AppState, body: &[u8]) -> Result<ForecastResponse, ApiError> {
    if !state.forecasts.is_model_loaded() {
        return Err(ForecastError::ModelNotLoaded.into());
    }

    let payload: Value = serde_json::from_slice(body)
        .map_err(|_| ApiError::bad_request("Request body is not valid JSON."))?;
    let ticker = payload.get("ticker").and_then(Value::as_str);

    let forecast = state.forecasts.forecast(ticker).await?;
    Ok(ForecastResponse::from(forecast))
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let model = state.forecasts.model();
    let status = if model.is_some() { "ok" } else { "degraded" };
    (
        StatusCode::OK,
        Json(json!({
            "status": status,
            "model_loaded": model.is_some(),
            "model": model.map(|m| m.name().to_string()),
            "version": model.map(|m| m.version().to_string()),
        })),
    )
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ohlc_record_uses_capitalized_keys_and_http_date() {
        let record = OhlcRecord {
            date: Utc.with_ymd_and_hms(2024, 3, 4, 5, 0, 0).unwrap(),
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 42,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["Date"], "Mon, 04 Mar 2024 05:00:00 GMT");
        assert_eq!(value["Open"], 1.0);
        assert_eq!(value["Volume"], 42);
    }

    #[test]
    fn test_error_mapping() {
        let err = ApiError::from(ForecastError::MissingTicker);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Stock ticker symbol not provided.");

        let err = ApiError::from(ForecastError::NoData {
            ticker: "ZZZZ".to_string(),
        });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "No data found for ticker: ZZZZ.");

        let err = ApiError::from(ForecastError::ModelNotLoaded);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Model is not loaded properly. Check server logs.");
    }

    #[test]
    fn test_other_errors_are_quoted() {
        let err = ApiError::from(ForecastError::Upstream(anyhow::anyhow!("timed \"out\"")));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), r#"An error occurred: "timed \"out\"""#);
    }
}
