//! Demo business service guarded by the interceptor chain.

use super::proto::{biz_server::Biz, Nothing};
use tonic::{Request, Response, Status};

#[derive(Debug, Default)]
pub struct BizService;

#[tonic::async_trait]
impl Biz for BizService {
    async fn check(&self, _request: Request<Nothing>) -> Result<Response<Nothing>, Status> {
        Ok(Response::new(Nothing::default()))
    }

    async fn add(&self, _request: Request<Nothing>) -> Result<Response<Nothing>, Status> {
        Ok(Response::new(Nothing::default()))
    }

    async fn test(&self, _request: Request<Nothing>) -> Result<Response<Nothing>, Status> {
        Ok(Response::new(Nothing::default()))
    }
}
