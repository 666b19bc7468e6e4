use crate::error::AppError;
use crate::http::{self, HttpError};
use crate::ml::{MlClient, MlFeatures, MlPrediction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::warn;

pub struct RemoteMlClient {
    endpoint: String,
    timeout: Duration,
}

impl RemoteMlClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    fn call(&self, route: &str, payload: &str) -> Result<String, RemoteError> {
        let url = http::join(&self.endpoint, route);
        http::post_json(&url, payload, self.timeout).map_err(RemoteError::Http)
    }
}

impl fmt::Debug for RemoteMlClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteMlClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl MlClient for RemoteMlClient {
    fn predict(&self, features: &MlFeatures) -> Result<MlPrediction, AppError> {
        let result = serde_json::to_string(features)
            .map_err(RemoteError::Json)
            .and_then(|payload| self.call("predict", &payload))
            .and_then(|body| serde_json::from_str::<MlPrediction>(&body).map_err(RemoteError::Json));
        result.map_err(|err| {
            warn!(endpoint = %self.endpoint, error = %err, "ML prediction failed");
            AppError::Ml(err.to_string())
        })
    }

    fn predict_batch(&self, features: &[MlFeatures]) -> Result<Vec<MlPrediction>, AppError> {
        let request = BatchRequest { readings: features };
        let result = serde_json::to_string(&request)
            .map_err(RemoteError::Json)
            .and_then(|payload| self.call("predict/batch", &payload))
            .and_then(|body| {
                serde_json::from_str::<BatchResponse>(&body).map_err(RemoteError::Json)
            });
        match result {
            Ok(response) => Ok(response.predictions),
            Err(err) => {
                warn!(endpoint = %self.endpoint, error = %err, "ML batch prediction failed");
                Err(AppError::Ml(err.to_string()))
            }
        }
    }

    fn health(&self) -> bool {
        match http::get(&http::join(&self.endpoint, "health"), self.timeout) {
            Ok(_) => true,
            Err(err) => {
                warn!(endpoint = %self.endpoint, error = %err, "ML health check failed");
                false
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    readings: &'a [MlFeatures],
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    predictions: Vec<MlPrediction>,
}

#[derive(Debug)]
enum RemoteError {
    Http(HttpError),
    Json(serde_json::Error),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Http(err) => write!(f, "{err}"),
            RemoteError::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_server::serve_once;

    const TIMEOUT: Duration = Duration::from_secs(2);

    #[test]
    fn predict_posts_features_and_keeps_service_category() -> Result<(), Box<dyn std::error::Error>>
    {
        // the service's own band for 95 differs from the local classifier on purpose
        let (endpoint, server) = serve_once(
            "200 OK",
            r##"{"predicted_aqi": 95, "category": "Unhealthy", "color": "#ff0000", "description": "custom", "input_pollutants": {}}"##,
        )?;
        let client = RemoteMlClient::new(endpoint, TIMEOUT);
        let features = MlFeatures {
            pm2_5: 35.0,
            ..MlFeatures::default()
        };

        let prediction = client.predict(&features)?;
        let request = server.join().map_err(|_| "server thread panicked")?;

        assert_eq!(prediction.predicted_aqi, 95);
        assert_eq!(prediction.category, "Unhealthy");
        assert_eq!(prediction.description, "custom");
        assert!(request.starts_with("POST /predict HTTP/1.1"));
        assert!(request.contains(r#""pm2_5":35.0"#));
        Ok(())
    }

    #[test]
    fn predict_batch_unwraps_predictions() -> Result<(), Box<dyn std::error::Error>> {
        let (endpoint, server) = serve_once(
            "200 OK",
            r##"{"predictions": [{"predicted_aqi": 40, "category": "Good", "color": "#00e400"}, {"predicted_aqi": 160, "category": "Unhealthy", "color": "#ff0000"}]}"##,
        )?;
        let client = RemoteMlClient::new(endpoint, TIMEOUT);

        let predictions = client.predict_batch(&[MlFeatures::default(), MlFeatures::default()])?;
        let request = server.join().map_err(|_| "server thread panicked")?;

        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[1].predicted_aqi, 160);
        assert!(request.starts_with("POST /predict/batch HTTP/1.1"));
        assert!(request.contains(r#""readings":["#));
        Ok(())
    }

    #[test]
    fn service_error_maps_to_ml_error() -> Result<(), Box<dyn std::error::Error>> {
        let (endpoint, server) = serve_once(
            "400 Bad Request",
            r#"{"error": "Missing required field: nh3"}"#,
        )?;
        let client = RemoteMlClient::new(endpoint, TIMEOUT);

        let result = client.predict(&MlFeatures::default());
        let _ = server.join();

        match result {
            Err(AppError::Ml(message)) => assert!(message.contains("400")),
            other => panic!("expected ml error, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn health_is_false_when_unreachable() {
        let client = RemoteMlClient::new("http://127.0.0.1:1", Duration::from_millis(200));

        assert!(!client.health());
    }

    #[test]
    fn health_is_true_on_success() -> Result<(), Box<dyn std::error::Error>> {
        let (endpoint, server) =
            serve_once("200 OK", r#"{"status": "healthy", "model_loaded": true}"#)?;
        let client = RemoteMlClient::new(endpoint, TIMEOUT);

        assert!(client.health());
        let request = server.join().map_err(|_| "server thread panicked")?;
        assert!(request.starts_with("GET /health HTTP/1.1"));
        Ok(())
    }
}
