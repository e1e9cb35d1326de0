//! Browser fetch API behind the core `ResourceFetcher` trait

use js_sys::{Reflect, Uint8Array};
use mishkat_core::{FetchError, ResourceFetcher};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{ReadableStreamDefaultReader, Response};

pub struct BrowserFetcher;

impl ResourceFetcher for BrowserFetcher {
    async fn fetch(&self, url: &str, on_progress: &dyn Fn(f32)) -> Result<Vec<u8>, FetchError> {
        let window = web_sys::window().ok_or_else(|| FetchError::transport(url, "no window"))?;

        let resp = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(|e| FetchError::transport(url, js_error(&e)))?;
        let resp: Response = resp
            .dyn_into()
            .map_err(|_| FetchError::transport(url, "response cast failed"))?;

        if !resp.ok() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status(),
            });
        }

        let total = content_length(&resp);
        match (resp.body(), total) {
            (Some(body), Some(total)) => {
                let reader = body.get_reader().unchecked_into::<ReadableStreamDefaultReader>();
                read_stream(url, &reader, total, on_progress).await
            }
            _ => {
                let buffer = resp
                    .array_buffer()
                    .map_err(|e| FetchError::transport(url, js_error(&e)))?;
                let buffer = JsFuture::from(buffer)
                    .await
                    .map_err(|e| FetchError::transport(url, js_error(&e)))?;
                Ok(Uint8Array::new(&buffer).to_vec())
            }
        }
    }
}

fn content_length(resp: &Response) -> Option<u64> {
    resp.headers()
        .get("content-length")
        .ok()
        .flatten()
        .and_then(|v| v.trim().parse().ok())
        .filter(|&n: &u64| n > 0)
}

/// Read the body chunk by chunk, reporting percent of `total`
async fn read_stream(
    url: &str,
    reader: &ReadableStreamDefaultReader,
    total: u64,
    on_progress: &dyn Fn(f32),
) -> Result<Vec<u8>, FetchError> {
    let mut bytes = Vec::with_capacity(total as usize);
    loop {
        let chunk = JsFuture::from(reader.read())
            .await
            .map_err(|e| FetchError::transport(url, js_error(&e)))?;
        let done = Reflect::get(&chunk, &"done".into())
            .map(|d| d.is_truthy())
            .unwrap_or(true);
        if done {
            break;
        }
        if let Ok(value) = Reflect::get(&chunk, &"value".into()) {
            bytes.extend(Uint8Array::new(&value).to_vec());
        }
        on_progress(percent(bytes.len() as u64, total));
    }
    Ok(bytes)
}

/// Download percent; compressed transfers can exceed the declared length
pub fn percent(received: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    ((received as f64 / total as f64) * 100.0).min(100.0) as f32
}

fn js_error(value: &wasm_bindgen::JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 200), 0.0);
        assert_eq!(percent(50, 200), 25.0);
        assert_eq!(percent(300, 200), 100.0);
        assert_eq!(percent(10, 0), 0.0);
    }
}
