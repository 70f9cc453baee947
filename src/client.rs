use crate::motors::PwmCommand;
use crate::telemetry::Orientation;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use std::error::Error;
use std::fmt;
use tracing::trace;

#[derive(Debug)]
pub enum DeviceError {
    Request(reqwest::Error),
    Status(StatusCode),
    Decode(reqwest::Error),
    InvalidUrl(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Request(e) => write!(f, "Request failed: {}", e),
            DeviceError::Status(status) => write!(f, "Device answered {}", status),
            DeviceError::Decode(e) => write!(f, "Unusable response body: {}", e),
            DeviceError::InvalidUrl(msg) => write!(f, "Invalid device URL: {}", msg),
        }
    }
}

impl Error for DeviceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DeviceError::Request(e) | DeviceError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: Client,
    data_url: Url,
    pwm_url: Url,
    recalibrate_url: Url,
}

impl DeviceClient {
    pub fn new(base_url: &str) -> Result<Self, DeviceError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| DeviceError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let endpoint = |path: &str| {
            base.join(path)
                .map_err(|e| DeviceError::InvalidUrl(format!("{}{}: {}", base, path, e)))
        };

        // The device sits on a local soft-AP, never behind a proxy.
        let http = Client::builder()
            .no_proxy()
            .build()
            .map_err(DeviceError::Request)?;

        Ok(Self {
            http,
            data_url: endpoint("data")?,
            pwm_url: endpoint("setPWM")?,
            recalibrate_url: endpoint("recalibrate")?,
        })
    }

    pub fn data_url(&self) -> &Url {
        &self.data_url
    }

    pub async fn fetch_orientation(&self) -> Result<Orientation, DeviceError> {
        let response = self
            .http
            .get(self.data_url.clone())
            .send()
            .await
            .map_err(DeviceError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeviceError::Status(status));
        }

        response
            .json::<Orientation>()
            .await
            .map_err(DeviceError::Decode)
    }

    fn pwm_request(&self, command: PwmCommand) -> RequestBuilder {
        self.http.get(self.pwm_url.clone()).query(&command)
    }

    // The response is ignored.
    pub async fn set_pwm(&self, command: PwmCommand) -> Result<(), DeviceError> {
        self.pwm_request(command)
            .send()
            .await
            .map_err(DeviceError::Request)?;
        Ok(())
    }

    // Resolves once the device answers, whatever the status.
    pub async fn recalibrate(&self) -> Result<(), DeviceError> {
        self.http
            .get(self.recalibrate_url.clone())
            .send()
            .await
            .map_err(DeviceError::Request)?;
        Ok(())
    }

    // Failures are not retried.
    pub fn send_pwm_detached(&self, command: PwmCommand) {
        let client = self.clone();
        tokio::spawn(async move {
            if let Err(e) = client.set_pwm(command).await {
                trace!(error = %e, ?command, "pwm command dropped");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    // One-shot HTTP/1.1 responder. Resolves to the request line it received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();

            let text = String::from_utf8_lossy(&request).into_owned();
            text.lines().next().unwrap_or_default().to_string()
        });

        (base, handle)
    }

    #[tokio::test]
    async fn fetches_and_decodes_orientation() {
        let (base, server) = serve_once("200 OK", r#"{"pitch":12.34,"roll":-5.6}"#).await;
        let client = DeviceClient::new(&base).unwrap();

        let orientation = client.fetch_orientation().await.unwrap();

        assert_eq!(
            orientation,
            Orientation {
                pitch: 12.34,
                roll: -5.6
            }
        );
        assert_eq!(server.await.unwrap(), "GET /data HTTP/1.1");
    }

    #[tokio::test]
    async fn server_errors_map_to_status() {
        let (base, server) = serve_once("500 Internal Server Error", "").await;
        let client = DeviceClient::new(&base).unwrap();

        let err = client.fetch_orientation().await.unwrap_err();

        assert!(matches!(err, DeviceError::Status(StatusCode::INTERNAL_SERVER_ERROR)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn non_json_body_maps_to_decode() {
        let (base, server) = serve_once("200 OK", "12.34,-5.60").await;
        let client = DeviceClient::new(&base).unwrap();

        let err = client.fetch_orientation().await.unwrap_err();

        assert!(matches!(err, DeviceError::Decode(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn set_pwm_sends_motors_in_order() {
        let (base, server) = serve_once("200 OK", "").await;
        let client = DeviceClient::new(&base).unwrap();

        client
            .set_pwm(PwmCommand {
                m1: 0,
                m2: 64,
                m3: 128,
                m4: 255,
            })
            .await
            .unwrap();

        assert_eq!(
            server.await.unwrap(),
            "GET /setPWM?m1=0&m2=64&m3=128&m4=255 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn recalibrate_resolves_on_any_status() {
        let (base, server) = serve_once("503 Service Unavailable", "").await;
        let client = DeviceClient::new(&base).unwrap();

        client.recalibrate().await.unwrap();

        assert_eq!(server.await.unwrap(), "GET /recalibrate HTTP/1.1");
    }

    #[tokio::test]
    async fn unreachable_device_is_a_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);
        let client = DeviceClient::new(&base).unwrap();

        let err = client.fetch_orientation().await.unwrap_err();

        assert!(matches!(err, DeviceError::Request(_)));
    }

    #[test]
    fn resolves_endpoints_against_base() {
        let client = DeviceClient::new("http://192.168.4.1").unwrap();
        assert_eq!(client.data_url().as_str(), "http://192.168.4.1/data");

        let nested = DeviceClient::new("http://localhost:8080/drone").unwrap();
        assert_eq!(nested.data_url().as_str(), "http://localhost:8080/drone/data");
    }

    #[test]
    fn rejects_unparseable_base() {
        let err = DeviceClient::new("192.168.4.1").unwrap_err();
        assert!(matches!(err, DeviceError::InvalidUrl(_)));
        assert!(err.to_string().starts_with("Invalid device URL"));
    }

    #[test]
    fn status_errors_render_the_code() {
        let err = DeviceError::Status(StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Device answered 404 Not Found");
    }
}
