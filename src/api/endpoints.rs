//! Paths of the REST resources, relative to the API base.

use url::form_urlencoded::byte_serialize;

fn segment(raw: &str) -> String {
    byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

pub const POSTS: &str = "/posts";
pub const FAVORITES: &str = "/favorites";
pub const SUBSCRIBERS: &str = "/subscribers";
pub const CURRENT_USER: &str = "/user/me";

pub fn posts_with_query(query: &str) -> String {
    if query.is_empty() {
        POSTS.to_string()
    } else {
        format!("{}?{}", POSTS, query)
    }
}

pub fn post(id: &str) -> String {
    format!("/posts/{}", segment(id))
}

pub fn post_by_slug(slug: &str) -> String {
    format!("/posts/slug/{}", segment(slug))
}

pub fn user_posts(user_id: &str) -> String {
    format!("/posts/user/{}", segment(user_id))
}

pub fn favorite(favorite_id: &str) -> String {
    format!("/favorites/{}", segment(favorite_id))
}

pub fn favorite_by_post(post_id: &str) -> String {
    format!("/favorites/post/{}", segment(post_id))
}

pub fn favorite_check(post_id: &str) -> String {
    format!("/favorites/check/{}", segment(post_id))
}

pub fn favorite_count(post_id: &str) -> String {
    format!("/favorites/count/{}", segment(post_id))
}

pub fn user_favorites(user_id: &str) -> String {
    format!("/favorites/user/{}", segment(user_id))
}

pub fn user(id: &str) -> String {
    format!("/user/{}", segment(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(post("65f1"), "/posts/65f1");
        assert_eq!(post_by_slug("summer-festival"), "/posts/slug/summer-festival");
        assert_eq!(favorite_by_post("p1"), "/favorites/post/p1");
        assert_eq!(favorite_check("p1"), "/favorites/check/p1");
        assert_eq!(user("me"), "/user/me");
        assert_eq!(posts_with_query(""), "/posts");
        assert_eq!(posts_with_query("page=2"), "/posts?page=2");
    }

    #[test]
    fn test_segments_are_escaped() {
        assert_eq!(post("a b/c"), "/posts/a%20b%2Fc");
    }
}
