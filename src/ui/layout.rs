//! Chrome around every protected page.

use super::{escape, shell, uploader};
use crate::file_type::Category;
use crate::identity::CurrentUser;

const DEFAULT_AVATAR: &str = "/assets/images/avatar.png";

/// What the layout needs besides the page body.
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext<'a> {
    pub user: &'a CurrentUser,
    /// Request path, used for the active nav item and upload invalidation.
    pub path: &'a str,
    pub uploader_id: &'a str,
    pub page_title: &'a str,
}

struct NavItem {
    name: &'static str,
    href: &'static str,
    icon: &'static str,
}

fn nav_items() -> Vec<NavItem> {
    let mut items = vec![NavItem {
        name: "Dashboard",
        href: "/",
        icon: "/assets/icons/dashboard.svg",
    }];
    items.extend(Category::ALL.iter().map(|category| NavItem {
        name: category.title(),
        href: category.href(),
        icon: category.icon(),
    }));
    items
}

/// Render a protected page: sidebar, mobile nav, header with the uploader,
/// the unchanged body, then the toaster.
pub fn protected_page(ctx: LayoutContext<'_>, body: &str) -> String {
    let content = format!(r#"<main class="flex h-screen">
    {sidebar}
    <section class="flex h-full flex-1 flex-col">
        {mobile_nav}
        {header}
        <div class="main-content">
{body}
        </div>
    </section>
    {toaster}
</main>"#,
        sidebar = sidebar(ctx.user, ctx.path),
        mobile_nav = mobile_nav(ctx.user, ctx.path),
        header = header(ctx.user, ctx.path, ctx.uploader_id),
        toaster = uploader::toaster(ctx.uploader_id),
    );
    shell::root_shell(Some(ctx.page_title), &content)
}

fn nav_links(path: &str, item_class: &str) -> String {
    nav_items()
        .iter()
        .map(|item| {
            let active = if item.href == path { " active" } else { "" };
            format!(
                r#"<li><a href="{href}" class="{item_class}{active}"><img src="{icon}" alt="{name}" width="24" height="24"><p>{name}</p></a></li>"#,
                href = item.href,
                icon = item.icon,
                name = item.name,
            )
        })
        .collect()
}

fn user_card(user: &CurrentUser) -> String {
    let avatar = escape(user.avatar.as_deref().unwrap_or(DEFAULT_AVATAR));
    format!(r#"<div class="sidebar-user-info">
        <img src="{avatar}" alt="Avatar" width="44" height="44" class="sidebar-user-avatar">
        <div class="hidden lg:block">
            <p class="subtitle-2 capitalize">{name}</p>
            <p class="caption">{email}</p>
        </div>
    </div>"#,
        name = escape(&user.full_name),
        email = escape(&user.email),
    )
}

fn sidebar(user: &CurrentUser, path: &str) -> String {
    format!(r#"<aside class="sidebar">
    <a href="/"><img src="/assets/icons/logo-full-brand.svg" alt="logo" width="160" height="50" class="hidden h-auto lg:block"></a>
    <nav class="sidebar-nav">
        <ul class="flex flex-1 flex-col gap-6">{links}</ul>
    </nav>
    {user}
</aside>"#,
        links = nav_links(path, "sidebar-nav-item"),
        user = user_card(user),
    )
}

fn mobile_nav(user: &CurrentUser, path: &str) -> String {
    format!(r#"<header class="mobile-header">
    <img src="/assets/icons/logo-full-brand.svg" alt="logo" width="120" height="52" class="h-auto">
    <details class="mobile-nav">
        <summary><img src="/assets/icons/menu.svg" alt="Search" width="30" height="30"></summary>
        {user}
        <ul class="mobile-nav-list">{links}</ul>
    </details>
</header>"#,
        links = nav_links(path, "mobile-nav-item"),
        user = user_card(user),
    )
}

fn header(user: &CurrentUser, path: &str, uploader_id: &str) -> String {
    format!(r#"<header class="header" data-user-id="{user_id}" data-account-id="{account_id}">
    <div class="header-wrapper">
        {uploader}
    </div>
</header>"#,
        user_id = escape(&user.id),
        account_id = escape(&user.account_id),
        uploader = uploader::uploader_form(uploader_id, path, ""),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> CurrentUser {
        CurrentUser {
            id: "user-1".to_string(),
            account_id: "acct-1".to_string(),
            full_name: "Ada <Lovelace>".to_string(),
            email: "ada@example.com".to_string(),
            avatar: None,
        }
    }

    #[test]
    fn test_protected_page_chrome() {
        let user = user();
        let html = protected_page(
            LayoutContext {
                user: &user,
                path: "/images",
                uploader_id: "up-1",
                page_title: "Images",
            },
            "<p id=\"body\">unchanged</p>",
        );

        assert!(html.contains(r#"class="sidebar""#));
        assert!(html.contains(r#"class="mobile-header""#));
        assert!(html.contains(r#"data-user-id="user-1" data-account-id="acct-1""#));
        assert!(html.contains(r#"name="uploader_id" value="up-1""#));
        assert!(html.contains(r#"<p id="body">unchanged</p>"#));
        assert!(html.contains(r#"id="toaster""#));
        assert!(html.contains(r#"href="/images" class="sidebar-nav-item active""#));
        assert!(html.contains("Ada &lt;Lovelace&gt;"));
        assert!(html.contains("<title>Images - StoreIt</title>"));
    }
}
