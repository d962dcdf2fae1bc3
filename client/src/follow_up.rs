use crate::{Chain, Error, Interceptor, RequestOptions, Result};
use async_trait::async_trait;
use waymark_http::{Method, Request, Response};

/// How many follow-up requests one call may issue before failing.
pub const MAX_FOLLOW_UPS: u32 = 20;

/// Drives the redirect loop.
///
/// Each redirect response is rewritten into a follow-up request per its
/// status code, the superseded response is closed and linked onto the next
/// one as a body-stripped prior response, and the loop is bounded by
/// [`MAX_FOLLOW_UPS`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FollowUpInterceptor;

#[async_trait]
impl Interceptor for FollowUpInterceptor {
    async fn intercept(&self, chain: Chain<'_>) -> Result<Response> {
        let mut request = chain.request().clone();
        let mut prior: Option<Response> = None;
        let mut follow_up_count: u32 = 0;

        loop {
            let mut response = chain.proceed(request).await?;
            if let Some(prior) = prior.take() {
                response = response
                    .into_builder()
                    .prior_response(Some(prior))
                    .build()?;
            }

            let Some(follow_up) = follow_up_request(&response, chain.options())? else {
                return Ok(response);
            };

            if follow_up
                .body()
                .is_some_and(|body| body.is_one_shot())
            {
                // a one-shot body cannot be replayed
                return Ok(response);
            }

            follow_up_count += 1;
            if follow_up_count > MAX_FOLLOW_UPS {
                response.close();
                return Err(Error::TooManyFollowUps(follow_up_count));
            }

            log::trace!(
                "follow-up {follow_up_count}: {} {}",
                follow_up.method(),
                follow_up.url().redact()
            );
            response.close();
            prior = Some(response);
            request = follow_up;
        }
    }
}

/// The request to issue next, or `None` when `response` stands as the
/// final answer.
fn follow_up_request(response: &Response, options: &RequestOptions) -> Result<Option<Request>> {
    if !response.is_redirect() || !options.follow_redirects {
        return Ok(None);
    }
    let Some(location) = response.header("Location") else {
        return Ok(None);
    };
    let Some(url) = response.request().url().resolve(location) else {
        return Ok(None);
    };

    let request_url = response.request().url();
    if url.scheme() != request_url.scheme() && !options.follow_ssl_redirects {
        return Ok(None);
    }

    let method = response.request().method();
    let code = response.code();
    let mut builder = response.request().new_builder();

    if method.permits_request_body() {
        let maintain_body = !method.redirects_to_get() || code == 307 || code == 308;
        if method.redirects_to_get() && code != 307 && code != 308 {
            builder = builder.method(Method::Get).body(None);
        } else {
            let body = if maintain_body {
                response.request().body().cloned()
            } else {
                None
            };
            builder = builder.method(method).body(body);
        }
        if !maintain_body {
            builder = builder
                .remove_header("Transfer-Encoding")
                .remove_header("Content-Length")
                .remove_header("Content-Type");
        }
    }

    // credentials do not travel to a different origin
    if !same_connection(request_url, &url) {
        builder = builder.remove_header("Authorization");
    }

    Ok(Some(builder.url(url).build()?))
}

fn same_connection(a: &waymark_url::HttpUrl, b: &waymark_url::HttpUrl) -> bool {
    a.host() == b.host() && a.port() == b.port() && a.scheme() == b.scheme()
}
