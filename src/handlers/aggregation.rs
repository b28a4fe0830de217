use axum::{extract::State, response::Json};
use chrono::Utc;
use common::{AggregationReport, Period};
use compute::{compute_aggregation, ComputeError};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use utoipa::IntoParams;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedQuery;
use crate::schemas::{ApiResponse, AppState};

#[derive(Debug, Default, Deserialize, Serialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct AggregationQuery {
    /// `month` (default), `quarter` or `year`
    pub period: Option<String>,
}

impl AggregationQuery {
    fn period(&self) -> ApiResult<Period> {
        match self.period.as_deref() {
            None => Ok(Period::default()),
            Some(raw) => raw.parse().map_err(|e| {
                warn!("Rejected period keyword '{}'", raw);
                ApiError::from(ComputeError::InvalidPeriod(e))
            }),
        }
    }
}

/// Income, spending and KPIs for the current period up to today
#[utoipa::path(
    get,
    path = "/aggregation",
    tag = "aggregation",
    security(("bearer_auth" = [])),
    params(AggregationQuery),
    responses(
        (status = 200, description = "Aggregation computed", body = ApiResponse<AggregationReport>),
        (status = 400, description = "Invalid period", body = crate::schemas::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_aggregation(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<AggregationQuery>,
) -> ApiResult<Json<ApiResponse<AggregationReport>>> {
    let period = query.period()?;
    let today = Utc::now().date_naive();
    let report = compute_aggregation(&state.db, auth.user_id, period, today).await?;

    debug!(
        "Aggregation for user {} over {}: earned {}, spent {}",
        auth.user_id, period, report.earned, report.spent
    );
    Ok(Json(ApiResponse {
        data: report,
        message: format!("Aggregation for the current {period}"),
        success: true,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(period: Option<&str>) -> AggregationQuery {
        AggregationQuery {
            period: period.map(str::to_string),
        }
    }

    #[test]
    fn test_period_defaults_to_month() {
        assert_eq!(query(None).period().ok(), Some(Period::Month));
    }

    #[test]
    fn test_period_keyword_is_exact() {
        assert_eq!(query(Some("quarter")).period().ok(), Some(Period::Quarter));
        for raw in ["Quarter", "MONTH", " year "] {
            let err = query(Some(raw)).period().unwrap_err();
            assert!(matches!(err, ApiError::BadRequest { .. }), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_unknown_period_is_bad_request() {
        let err = query(Some("week")).period().unwrap_err();
        assert_eq!(err.to_string(), "Invalid period, use month|quarter|year");
    }
}
