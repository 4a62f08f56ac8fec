//! Application route surface and navigation metadata.
//!
//! Matching ignores a trailing slash, the query string, and the fragment.
//! The raw path is kept on [`NavigationTarget`] so a login redirect can send
//! the user back to exactly what they asked for.

use serde::Serialize;

/// Landing route for authenticated users.
pub const HOME_PATH: &str = "/home";

/// Public sign-in page.
pub const LOGIN_PATH: &str = "/login";

/// Every route the application knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppRoute {
    /// Public sign-in form.
    Login,
    /// Public registration form.
    Register,
    /// `/`, which forwards to [`AppRoute::Home`].
    Root,
    /// Dashboard.
    Home,
    /// Product inventory.
    Products,
    /// Category management.
    Categories,
    /// User and system preferences.
    Settings,
    /// Anything unmatched; rendered inside the protected layout.
    NotFound,
}

/// Routes shown in the sidebar, in display order.
pub const SIDEBAR_ROUTES: [AppRoute; 4] = [
    AppRoute::Home,
    AppRoute::Products,
    AppRoute::Categories,
    AppRoute::Settings,
];

impl AppRoute {
    /// Resolve a raw path (query and fragment allowed) to its route.
    pub fn resolve(raw: &str) -> Self {
        match normalise_path(raw).as_str() {
            "/" => Self::Root,
            LOGIN_PATH => Self::Login,
            "/register" => Self::Register,
            HOME_PATH => Self::Home,
            "/products" => Self::Products,
            "/categories" => Self::Categories,
            "/settings" => Self::Settings,
            _ => Self::NotFound,
        }
    }

    /// Canonical path; `None` for the not-found view.
    pub const fn path(self) -> Option<&'static str> {
        match self {
            Self::Login => Some(LOGIN_PATH),
            Self::Register => Some("/register"),
            Self::Root => Some("/"),
            Self::Home => Some(HOME_PATH),
            Self::Products => Some("/products"),
            Self::Categories => Some("/categories"),
            Self::Settings => Some("/settings"),
            Self::NotFound => None,
        }
    }

    /// Whether only an authenticated principal may see the route.
    pub const fn requires_auth(self) -> bool {
        !self.is_auth_page()
    }

    /// Whether the route is one of the public sign-in/sign-up forms.
    pub const fn is_auth_page(self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }

    /// Where the router forwards this route, if anywhere.
    pub const fn redirect(self) -> Option<&'static str> {
        match self {
            Self::Root => Some(HOME_PATH),
            _ => None,
        }
    }

    /// Page title.
    pub const fn title(self) -> &'static str {
        match self {
            Self::Login => "Iniciar sesión",
            Self::Register => "Crear cuenta",
            Self::Root | Self::Home => "Inicio",
            Self::Products => "Productos",
            Self::Categories => "Categorías",
            Self::Settings => "Configuración",
            Self::NotFound => "Página no encontrada",
        }
    }

    /// One-line description used by the navigation bar.
    pub const fn description(self) -> Option<&'static str> {
        match self {
            Self::Home => Some("Dashboard principal con estadísticas y resumen"),
            Self::Products => Some("Gestión completa del inventario de productos"),
            Self::Categories => Some("Organización y gestión de categorías de productos"),
            Self::Settings => Some("Configuración del sistema y preferencias de usuario"),
            Self::Login | Self::Register | Self::Root | Self::NotFound => None,
        }
    }

    /// Whether the sidebar lists the route.
    pub fn show_in_sidebar(self) -> bool {
        SIDEBAR_ROUTES.contains(&self)
    }
}

/// Sidebar routes that require authentication.
pub fn protected_routes() -> impl Iterator<Item = AppRoute> {
    SIDEBAR_ROUTES
        .into_iter()
        .filter(|route| route.requires_auth())
}

/// Strip query, fragment, and trailing slashes; always keeps a leading `/`.
pub fn normalise_path(raw: &str) -> String {
    let path = raw
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim()
        .trim_end_matches('/');
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

/// A navigation request: the path as typed and the route it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationTarget {
    requested: String,
    route: AppRoute,
}

impl NavigationTarget {
    /// Resolve `raw` and remember it verbatim.
    pub fn parse(raw: &str) -> Self {
        let requested = raw.trim();
        let requested = if requested.is_empty() { "/" } else { requested };
        Self {
            requested: requested.to_owned(),
            route: AppRoute::resolve(requested),
        }
    }

    /// The path exactly as requested, query and fragment included.
    pub fn requested(&self) -> &str {
        &self.requested
    }

    /// The resolved route.
    pub fn route(&self) -> AppRoute {
        self.route
    }

    /// Whether the target needs an authenticated principal.
    pub fn requires_auth(&self) -> bool {
        self.route.requires_auth()
    }

    /// Whether the target is a sign-in or sign-up form.
    pub fn is_auth_page(&self) -> bool {
        self.route.is_auth_page()
    }
}

/// One breadcrumb segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breadcrumb {
    /// Link target.
    pub path: &'static str,
    /// Displayed label.
    pub title: &'static str,
    /// Whether this is the current page.
    pub is_last: bool,
}

/// Breadcrumbs for `path`: `Inicio` first, then the current sidebar route.
pub fn breadcrumbs(path: &str) -> Vec<Breadcrumb> {
    let route = AppRoute::resolve(path);
    let at_home = route == AppRoute::Home;
    let mut trail = vec![Breadcrumb {
        path: HOME_PATH,
        title: AppRoute::Home.title(),
        is_last: at_home,
    }];
    if let Some(current) = route.path().filter(|_| !at_home && route.show_in_sidebar()) {
        trail.push(Breadcrumb {
            path: current,
            title: route.title(),
            is_last: true,
        });
    }
    trail
}

/// Where to go after a successful sign-in.
///
/// `return_to` is honoured only for in-app paths that are not auth pages;
/// anything else (absent, external, protocol-relative) lands on `/home`.
pub fn post_login_destination(return_to: Option<&str>) -> String {
    return_to
        .map(str::trim)
        .filter(|path| path.starts_with('/') && !path.starts_with("//"))
        .filter(|path| !AppRoute::resolve(path).is_auth_page())
        .map_or_else(|| HOME_PATH.to_owned(), str::to_owned)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/", AppRoute::Root)]
    #[case("", AppRoute::Root)]
    #[case("/login", AppRoute::Login)]
    #[case("/register/", AppRoute::Register)]
    #[case("/home?tab=stats", AppRoute::Home)]
    #[case("/products#top", AppRoute::Products)]
    #[case("categories", AppRoute::Categories)]
    #[case("/settings", AppRoute::Settings)]
    #[case("/categorias", AppRoute::NotFound)]
    #[case("/home/extra", AppRoute::NotFound)]
    fn paths_resolve_to_routes(#[case] path: &str, #[case] expected: AppRoute) {
        assert_eq!(AppRoute::resolve(path), expected);
    }

    #[test]
    fn only_auth_pages_are_public() {
        let public: Vec<AppRoute> = [
            AppRoute::Login,
            AppRoute::Register,
            AppRoute::Root,
            AppRoute::Home,
            AppRoute::Products,
            AppRoute::Categories,
            AppRoute::Settings,
            AppRoute::NotFound,
        ]
        .into_iter()
        .filter(|route| !route.requires_auth())
        .collect();
        assert_eq!(public, vec![AppRoute::Login, AppRoute::Register]);
    }

    #[test]
    fn target_keeps_the_requested_path_verbatim() {
        let target = NavigationTarget::parse("/categories/?q=bebidas");
        assert_eq!(target.route(), AppRoute::Categories);
        assert_eq!(target.requested(), "/categories/?q=bebidas");
        assert!(target.requires_auth());
    }

    #[test]
    fn sidebar_lists_the_four_sections() {
        let titles: Vec<&str> = SIDEBAR_ROUTES.iter().map(|route| route.title()).collect();
        assert_eq!(
            titles,
            vec!["Inicio", "Productos", "Categorías", "Configuración"]
        );
        assert_eq!(protected_routes().count(), 4);
        assert!(!AppRoute::Login.show_in_sidebar());
    }

    #[test]
    fn breadcrumbs_start_at_home() {
        let trail = breadcrumbs("/categories");
        let titles: Vec<(&str, bool)> = trail.iter().map(|crumb| (crumb.title, crumb.is_last)).collect();
        assert_eq!(titles, vec![("Inicio", false), ("Categorías", true)]);

        let home = breadcrumbs("/home");
        assert_eq!(home.len(), 1);
        assert!(home.iter().all(|crumb| crumb.is_last));

        assert_eq!(breadcrumbs("/nowhere").len(), 1);
    }

    #[rstest]
    #[case(None, "/home")]
    #[case(Some("/categories?q=x"), "/categories?q=x")]
    #[case(Some("/login"), "/home")]
    #[case(Some("https://evil.example"), "/home")]
    #[case(Some("//evil.example"), "/home")]
    fn post_login_destination_only_follows_in_app_paths(
        #[case] return_to: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(post_login_destination(return_to), expected);
    }
}
