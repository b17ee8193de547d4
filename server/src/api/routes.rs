use crate::api::model::{ErrorBody, HealthReport, UploadResponse};
use crate::ingest::parse_upload;
use crate::workflow::runner::Runner;
use bytes::BufMut;
use futures_util::TryStreamExt;
use log::{info, warn};
use serde::Serialize;
use spectracore::interface::{ProcessRequest, ProcessResponse, StatisticsRequest};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use warp::http::StatusCode;
use warp::multipart::FormData;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

type SharedLatest = Arc<RwLock<Option<ProcessResponse>>>;

const UPLOAD_FIELD: &str = "files";

/// Hosts the HTTP endpoints and remembers the latest processed batch.
pub struct ApiBridge {
    runner: Arc<Runner>,
    latest: SharedLatest,
}

impl ApiBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self {
            runner,
            latest: Arc::new(RwLock::new(None)),
        }
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone + Send + Sync + 'static
    {
        let runner = self.runner.clone();
        let runner_filter = warp::any().map(move || runner.clone());
        let latest = self.latest.clone();
        let latest_filter = warp::any().map(move || latest.clone());
        let max_upload = self.runner.config().max_upload_bytes;

        let health_route = warp::path("health")
            .and(warp::path::end())
            .and(warp::get())
            .and(runner_filter.clone())
            .map(|runner: Arc<Runner>| {
                json_reply(
                    &HealthReport {
                        status: "ok",
                        metrics: runner.metrics(),
                    },
                    StatusCode::OK,
                )
            });

        let latest_route = warp::path("latest")
            .and(warp::path::end())
            .and(warp::get())
            .and(latest_filter.clone())
            .map(|latest: SharedLatest| match latest.read() {
                Ok(guard) => match guard.as_ref() {
                    Some(response) => json_reply(response, StatusCode::OK),
                    None => error_reply(StatusCode::NOT_FOUND, "no data processed yet"),
                },
                Err(_) => error_reply(StatusCode::INTERNAL_SERVER_ERROR, "state unavailable"),
            });

        let upload_route = warp::path("upload_files")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::multipart::form().max_length(max_upload))
            .and_then(handle_upload);

        let process_route = warp::path("process_data")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(runner_filter.clone())
            .and(latest_filter)
            .and_then(handle_process);

        let statistics_route = warp::path("statistics")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(runner_filter)
            .and_then(handle_statistics);

        health_route
            .or(latest_route)
            .or(upload_route)
            .or(process_route)
            .or(statistics_route)
            .recover(handle_rejection)
    }

    pub async fn serve(&self, address: SocketAddr) {
        info!("HTTP API listening on {}", address);
        warp::serve(self.routes()).run(address).await;
    }

    pub fn latest(&self) -> Option<ProcessResponse> {
        self.latest.read().ok().and_then(|guard| guard.clone())
    }
}

fn json_reply<T: Serialize>(body: &T, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

fn error_reply(status: StatusCode, message: impl Into<String>) -> Response {
    json_reply(&ErrorBody::new(message), status)
}

type UploadPart = (String, Option<String>, Vec<u8>);

async fn read_parts(form: FormData) -> Result<Vec<UploadPart>, warp::Error> {
    form.and_then(|part| async move {
        let field = part.name().to_string();
        let filename = part.filename().map(str::to_string);
        let data = part
            .stream()
            .try_fold(Vec::new(), |mut acc, buf| async move {
                acc.put(buf);
                Ok::<_, warp::Error>(acc)
            })
            .await?;
        Ok::<_, warp::Error>((field, filename, data))
    })
    .try_collect()
    .await
}

async fn handle_upload(form: FormData) -> Result<Response, Rejection> {
    let parts = match read_parts(form).await {
        Ok(parts) => parts,
        Err(err) => {
            return Ok(error_reply(
                StatusCode::BAD_REQUEST,
                format!("failed to read upload: {}", err),
            ))
        }
    };

    let files: Vec<_> = parts
        .into_iter()
        .filter(|(field, _, _)| field == UPLOAD_FIELD)
        .collect();
    if files.is_empty() {
        return Ok(error_reply(StatusCode::BAD_REQUEST, "no files found"));
    }

    let mut response = UploadResponse {
        message: "files uploaded successfully".to_string(),
        ..Default::default()
    };
    for (_, filename, data) in files {
        let filename = filename.unwrap_or_default();
        match parse_upload(&filename, &data) {
            Ok(spectrum) => {
                response.files.push(spectrum.name);
                response.frequencies.push(spectrum.frequencies);
                response.amplitudes.push(spectrum.amplitudes);
            }
            Err(err) => {
                warn!("upload rejected: {:#}", err);
                return Ok(error_reply(StatusCode::BAD_REQUEST, format!("{:#}", err)));
            }
        }
    }

    info!("accepted {} uploaded files", response.files.len());
    Ok(json_reply(&response, StatusCode::OK))
}

async fn handle_process(
    request: ProcessRequest,
    runner: Arc<Runner>,
    latest: SharedLatest,
) -> Result<Response, Rejection> {
    let outcome = tokio::task::spawn_blocking(move || runner.execute(&request)).await;
    match outcome {
        Ok(Ok(response)) => {
            if let Ok(mut guard) = latest.write() {
                *guard = Some(response.clone());
            }
            Ok(json_reply(&response, StatusCode::OK))
        }
        Ok(Err(err)) => {
            warn!("process_data error: {:#}", err);
            Ok(error_reply(
                StatusCode::BAD_REQUEST,
                format!("data processing error: {:#}", err),
            ))
        }
        Err(err) => Ok(error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("processing task failed: {}", err),
        )),
    }
}

async fn handle_statistics(
    request: StatisticsRequest,
    runner: Arc<Runner>,
) -> Result<Response, Rejection> {
    let stats = runner.statistics(&request);
    Ok(json_reply(&stats, StatusCode::OK))
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_string())
    } else if let Some(body) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, format!("invalid request body: {}", body))
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "payload too large".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        (StatusCode::BAD_REQUEST, format!("bad request: {:?}", err))
    };
    Ok(error_reply(status, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{build_spectrum, to_delimited_text, GeneratorConfig};
    use crate::workflow::config::ServiceConfig;
    use serde_json::{json, Value};

    const BOUNDARY: &str = "spectra-boundary";

    fn bridge() -> ApiBridge {
        ApiBridge::new(Arc::new(Runner::new(ServiceConfig::default())))
    }

    fn multipart_body(files: &[(&str, &str)]) -> String {
        let mut body = String::new();
        for (name, content) in files {
            body.push_str(&format!(
                "--{}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\nContent-Type: text/plain\r\n\r\n{}\r\n",
                BOUNDARY, name, content
            ));
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));
        body
    }

    async fn upload(bridge: &ApiBridge, files: &[(&str, &str)]) -> (StatusCode, Value) {
        let res = warp::test::request()
            .method("POST")
            .path("/upload_files")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(multipart_body(files))
            .reply(&bridge.routes())
            .await;
        (res.status(), serde_json::from_slice(res.body()).unwrap())
    }

    #[tokio::test]
    async fn upload_then_process_end_to_end() {
        let bridge = bridge();
        let series = build_spectrum(&GeneratorConfig {
            points: 50,
            seed: 7,
            ..Default::default()
        })
        .unwrap();
        let text = to_delimited_text(&series, ",").unwrap();

        let (status, uploaded) = upload(&bridge, &[("scan.csv", text.as_str())]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(uploaded["files"], json!(["scan.csv"]));

        let res = warp::test::request()
            .method("POST")
            .path("/process_data")
            .json(&json!({
                "frequencies": uploaded["frequencies"],
                "amplitudes": uploaded["amplitudes"],
                "remove_baseline": true,
                "apply_smoothing": true,
                "normalize": true,
                "find_peaks": true
            }))
            .reply(&bridge.routes())
            .await;
        assert_eq!(res.status(), StatusCode::OK);

        let response: ProcessResponse = serde_json::from_slice(res.body()).unwrap();
        let amplitudes = &response.processed_amplitudes[0];
        assert_eq!(amplitudes.len(), 50);
        assert_eq!(response.frequencies[0].len(), 50);
        let mean = amplitudes.iter().sum::<f64>() / 50.0;
        let var = amplitudes.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 50.0;
        assert!(mean.abs() < 1e-9);
        assert!((var - 1.0).abs() < 1e-9);
        assert_eq!(response.peaks[0].len(), response.peaks_values[0].len());
        assert_eq!(
            bridge.latest().map(|latest| latest.total_peaks()),
            Some(response.total_peaks())
        );
    }

    #[tokio::test]
    async fn upload_rejects_unsupported_extension() {
        let (status, body) = upload(&bridge(), &[("scan.pdf", "1 2\n")]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("unsupported file type"));
    }

    #[tokio::test]
    async fn upload_accepts_esp_files() {
        let (status, body) = upload(&bridge(), &[("a.esp", "#meta\n1 2\n3 4\n")]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amplitudes"], json!([[2.0, 4.0]]));
    }

    #[tokio::test]
    async fn process_errors_become_bad_request() {
        let bridge = bridge();
        let res = warp::test::request()
            .method("POST")
            .path("/process_data")
            .json(&json!({
                "frequencies": [[1.0, 2.0]],
                "amplitudes": [[1.0, 2.0]],
                "min_freq": 5.0,
                "max_freq": 1.0
            }))
            .reply(&bridge.routes())
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("greater than maximum frequency"));
        assert_eq!(bridge.latest(), None);
    }

    #[tokio::test]
    async fn malformed_body_is_recovered_as_json() {
        let res = warp::test::request()
            .method("POST")
            .path("/process_data")
            .header("content-type", "application/json")
            .body("{not json")
            .reply(&bridge().routes())
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("invalid request body"));
    }

    #[tokio::test]
    async fn statistics_route_returns_boxplots() {
        let res = warp::test::request()
            .method("POST")
            .path("/statistics")
            .json(&json!({
                "amplitudes": [[1, 2, 3, 4, 5, 6, 7, 8, 9, 100], [1, 1, 1, 1, 1, 1, 1, 1, 1, 1]]
            }))
            .reply(&bridge().routes())
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["boxplot"][0]["outliers"], json!([100.0]));
        assert_eq!(body["mean"].as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn statistics_route_skips_empty_series() {
        let res = warp::test::request()
            .method("POST")
            .path("/statistics")
            .json(&json!({ "amplitudes": [[1, 2, 3], []] }))
            .reply(&bridge().routes())
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["boxplot"].as_array().unwrap().len(), 1);
        assert_eq!(body["boxplot"][0]["median"], json!(2.0));
        assert!(body.get("mean").is_none());
        assert!(body["mean_std_error"].is_string());
    }

    #[tokio::test]
    async fn health_and_latest_routes() {
        let bridge = bridge();
        let res = warp::test::request()
            .path("/health")
            .reply(&bridge.routes())
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["status"], "ok");

        let res = warp::test::request()
            .path("/latest")
            .reply(&bridge.routes())
            .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
