//! The authenticated principal as returned by `POST /api/auth/web/login/`.
//!
//! The record is a denormalized snapshot; it is cached with the session and
//! never re-fetched per navigation.

use serde::{Deserialize, Serialize};

/// Role descriptor the console requires.
pub const ADMIN_ROLE: &str = "ADMINISTRADOR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub perfil: Option<Perfil>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perfil {
    pub id: i64,
    #[serde(default)]
    pub ci: String,
    #[serde(default)]
    pub telefono: String,
    pub tipo_usuario: TipoUsuario,
    pub condominio: Option<CondominioRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipoUsuario {
    pub tipo: String,
    #[serde(default)]
    pub descripcion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondominioRef {
    pub id: String,
    pub nombre: String,
}

impl AuthUser {
    /// Full name, falling back to the username when both parts are blank
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }

    /// Role descriptor (`tipo_usuario.tipo`), if a profile is attached
    pub fn role(&self) -> Option<&str> {
        self.perfil.as_ref().map(|p| p.tipo_usuario.tipo.as_str())
    }

    pub fn is_administrator(&self) -> bool {
        self.role()
            .map(|r| r.eq_ignore_ascii_case(ADMIN_ROLE))
            .unwrap_or(false)
    }

    pub fn condominio_name(&self) -> Option<&str> {
        self.perfil
            .as_ref()
            .and_then(|p| p.condominio.as_ref())
            .map(|c| c.nombre.as_str())
    }
}
