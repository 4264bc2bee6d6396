//! The console's data endpoints.
//!
//! Their schemas belong to the backend, so everything here is plain JSON in
//! and JSON-or-text out. Every call goes through
//! `AuthGateway::authenticated_fetch` and gets the refresh-and-retry
//! behaviour for free.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::client::AuthGateway;
use super::transport::{ApiRequest, Payload};
use super::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Usuarios,
    Unidades,
    AreasComunes,
    Camaras,
    Alertas,
    Accesos,
    Cuotas,
    Mantenimiento,
    Estadisticas,
    ReporteFinanciero,
    ReporteSeguridad,
    ReporteOcupacion,
}

impl Resource {
    pub const ALL: [Resource; 12] = [
        Resource::Usuarios,
        Resource::Unidades,
        Resource::AreasComunes,
        Resource::Camaras,
        Resource::Alertas,
        Resource::Accesos,
        Resource::Cuotas,
        Resource::Mantenimiento,
        Resource::Estadisticas,
        Resource::ReporteFinanciero,
        Resource::ReporteSeguridad,
        Resource::ReporteOcupacion,
    ];

    /// Collection path, always with a trailing slash
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Usuarios => "/api/usuarios/",
            Resource::Unidades => "/api/unidades/",
            Resource::AreasComunes => "/api/areas-comunes/",
            Resource::Camaras => "/api/camaras/",
            Resource::Alertas => "/api/alertas/",
            Resource::Accesos => "/api/accesos/",
            Resource::Cuotas => "/api/cuotas/",
            Resource::Mantenimiento => "/api/mantenimiento/",
            Resource::Estadisticas => "/api/estadisticas/",
            Resource::ReporteFinanciero => "/api/reportes/financiero/",
            Resource::ReporteSeguridad => "/api/reportes/seguridad/",
            Resource::ReporteOcupacion => "/api/reportes/ocupacion/",
        }
    }

    /// Short name used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Resource::Usuarios => "usuarios",
            Resource::Unidades => "unidades",
            Resource::AreasComunes => "areas-comunes",
            Resource::Camaras => "camaras",
            Resource::Alertas => "alertas",
            Resource::Accesos => "accesos",
            Resource::Cuotas => "cuotas",
            Resource::Mantenimiento => "mantenimiento",
            Resource::Estadisticas => "estadisticas",
            Resource::ReporteFinanciero => "reportes/financiero",
            Resource::ReporteSeguridad => "reportes/seguridad",
            Resource::ReporteOcupacion => "reportes/ocupacion",
        }
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}{}/", self.path(), id.trim_matches('/'))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_matches('/').to_ascii_lowercase();
        Resource::ALL
            .iter()
            .copied()
            .find(|r| r.name() == wanted)
            .ok_or_else(|| format!("unknown resource '{}'", s))
    }
}

/// Bearer-authenticated access to the console's resources.
/// Clone is cheap - the gateway is shared.
#[derive(Clone)]
pub struct ResourceClient {
    gateway: Arc<AuthGateway>,
}

impl ResourceClient {
    pub fn new(gateway: Arc<AuthGateway>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, resource: Resource) -> Result<Payload, AuthError> {
        self.execute(ApiRequest::get(self.gateway.url(resource.path())))
            .await
    }

    pub async fn get(&self, resource: Resource, id: &str) -> Result<Payload, AuthError> {
        self.execute(ApiRequest::get(self.gateway.url(&resource.item_path(id))))
            .await
    }

    pub async fn create(
        &self,
        resource: Resource,
        body: serde_json::Value,
    ) -> Result<Payload, AuthError> {
        let request = ApiRequest::post(self.gateway.url(resource.path())).with_body(body);
        self.execute(request).await
    }

    pub async fn update(
        &self,
        resource: Resource,
        id: &str,
        body: serde_json::Value,
    ) -> Result<Payload, AuthError> {
        let request =
            ApiRequest::put(self.gateway.url(&resource.item_path(id))).with_body(body);
        self.execute(request).await
    }

    pub async fn delete(&self, resource: Resource, id: &str) -> Result<Payload, AuthError> {
        self.execute(ApiRequest::delete(self.gateway.url(&resource.item_path(id))))
            .await
    }

    /// `POST /api/alertas/{id}/revisar/`
    pub async fn mark_alert_reviewed(&self, id: i64) -> Result<Payload, AuthError> {
        let path = format!("{}revisar/", Resource::Alertas.item_path(&id.to_string()));
        self.execute(ApiRequest::post(self.gateway.url(&path))).await
    }

    async fn execute(&self, request: ApiRequest) -> Result<Payload, AuthError> {
        let response = self.gateway.authenticated_fetch(request).await?;
        let response = response.error_for_status()?;
        Ok(response.payload())
    }
}
