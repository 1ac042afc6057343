#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{FromRequest, Multipart},
    http::{Request, header},
};
use chrono::Utc;
use gallery_api::{
    AppState,
    auth::{self, AuthUser, Role},
    config::AppConfig,
    mailer::{MailerState, MockMailer},
    models::{
        Admin, Artwork, ArtworkLike, Contact, CreateContactRequest, NewAdmin, NewArtwork, NewUser,
        User, UserChanges,
    },
    repository::{RepoResult, Repository, RepositoryState},
    revocation::{InMemoryRevocationStore, RevocationState},
    storage::{MockStorageService, StorageState},
};
use std::sync::{Arc, Mutex};

// --- In-Memory Repository ---

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    admins: Vec<Admin>,
    artworks: Vec<Artwork>,
    likes: Vec<ArtworkLike>,
    contacts: Vec<Contact>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A `Repository` over plain vectors, with the same cascade and uniqueness behavior the
/// Postgres schema gives.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn like_rows(&self) -> Vec<ArtworkLike> {
        self.tables.lock().unwrap().likes.clone()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> RepoResult<Vec<User>> {
        Ok(self.tables.lock().unwrap().users.clone())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut t = self.tables.lock().unwrap();
        let created = User {
            id: t.next_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
            profile_image: user.profile_image,
        };
        t.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> RepoResult<Option<User>> {
        let mut t = self.tables.lock().unwrap();
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        if let Some(image) = changes.profile_image {
            user.profile_image = Some(image);
        }
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: i64) -> RepoResult<bool> {
        let mut t = self.tables.lock().unwrap();
        if !t.users.iter().any(|u| u.id == id) {
            return Ok(false);
        }
        t.likes.retain(|l| l.user_id != id);
        for artwork in t.artworks.iter_mut().filter(|a| a.user_id == Some(id)) {
            artwork.user_id = None;
        }
        t.users.retain(|u| u.id != id);
        Ok(true)
    }

    async fn find_admin_by_email(&self, email: &str) -> RepoResult<Option<Admin>> {
        let t = self.tables.lock().unwrap();
        Ok(t.admins.iter().find(|a| a.email == email).cloned())
    }

    async fn find_admin_by_username(&self, username: &str) -> RepoResult<Option<Admin>> {
        let t = self.tables.lock().unwrap();
        Ok(t.admins.iter().find(|a| a.username == username).cloned())
    }

    async fn create_admin(&self, admin: NewAdmin) -> RepoResult<Admin> {
        let mut t = self.tables.lock().unwrap();
        let created = Admin {
            id: t.next_id(),
            username: admin.username,
            email: admin.email,
            password_hash: admin.password_hash,
            role: admin.role,
            created_at: Utc::now(),
        };
        t.admins.push(created.clone());
        Ok(created)
    }

    async fn create_artwork(&self, artwork: NewArtwork) -> RepoResult<Artwork> {
        let mut t = self.tables.lock().unwrap();
        let created = Artwork {
            id: t.next_id(),
            name: artwork.name,
            email: artwork.email,
            style: artwork.style,
            image_url: artwork.image_url,
            description: artwork.description,
            user_id: artwork.user_id,
        };
        t.artworks.push(created.clone());
        Ok(created)
    }

    async fn get_artwork(&self, id: i64) -> RepoResult<Option<Artwork>> {
        let t = self.tables.lock().unwrap();
        Ok(t.artworks.iter().find(|a| a.id == id).cloned())
    }

    async fn list_artworks_by_style(&self, style: &str) -> RepoResult<Vec<Artwork>> {
        let t = self.tables.lock().unwrap();
        Ok(t.artworks.iter().filter(|a| a.style == style).cloned().collect())
    }

    async fn list_artworks_by_owner(&self, user_id: i64) -> RepoResult<Vec<Artwork>> {
        let t = self.tables.lock().unwrap();
        Ok(t.artworks
            .iter()
            .filter(|a| a.user_id == Some(user_id))
            .cloned()
            .collect())
    }

    async fn delete_artwork(&self, id: i64) -> RepoResult<bool> {
        let mut t = self.tables.lock().unwrap();
        if !t.artworks.iter().any(|a| a.id == id) {
            return Ok(false);
        }
        t.likes.retain(|l| l.artwork_id != id);
        t.artworks.retain(|a| a.id != id);
        Ok(true)
    }

    async fn find_like(&self, artwork_id: i64, user_id: i64) -> RepoResult<Option<ArtworkLike>> {
        let t = self.tables.lock().unwrap();
        Ok(t.likes
            .iter()
            .find(|l| l.artwork_id == artwork_id && l.user_id == user_id)
            .cloned())
    }

    async fn insert_like(&self, artwork_id: i64, user_id: i64) -> RepoResult<bool> {
        let mut t = self.tables.lock().unwrap();
        if t.likes
            .iter()
            .any(|l| l.artwork_id == artwork_id && l.user_id == user_id)
        {
            return Ok(false);
        }
        let id = t.next_id();
        t.likes.push(ArtworkLike {
            id,
            artwork_id,
            user_id,
        });
        Ok(true)
    }

    async fn delete_like(&self, artwork_id: i64, user_id: i64) -> RepoResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.likes.len();
        t.likes
            .retain(|l| !(l.artwork_id == artwork_id && l.user_id == user_id));
        Ok(t.likes.len() != before)
    }

    async fn count_likes(&self, artwork_id: i64) -> RepoResult<i64> {
        let t = self.tables.lock().unwrap();
        Ok(t.likes.iter().filter(|l| l.artwork_id == artwork_id).count() as i64)
    }

    async fn list_likes_by_user(&self, user_id: i64) -> RepoResult<Vec<ArtworkLike>> {
        let t = self.tables.lock().unwrap();
        Ok(t.likes.iter().filter(|l| l.user_id == user_id).cloned().collect())
    }

    async fn create_contact(&self, contact: CreateContactRequest) -> RepoResult<Contact> {
        let mut t = self.tables.lock().unwrap();
        let created = Contact {
            id: t.next_id(),
            name: contact.name,
            email: contact.email,
            message: contact.message,
            posted_at: Utc::now(),
        };
        t.contacts.push(created.clone());
        Ok(created)
    }

    async fn list_contacts(&self) -> RepoResult<Vec<Contact>> {
        Ok(self.tables.lock().unwrap().contacts.clone())
    }

    async fn list_contacts_by_email(&self, email: &str) -> RepoResult<Vec<Contact>> {
        let t = self.tables.lock().unwrap();
        Ok(t.contacts.iter().filter(|c| c.email == email).cloned().collect())
    }

    async fn get_contact(&self, id: i64) -> RepoResult<Option<Contact>> {
        let t = self.tables.lock().unwrap();
        Ok(t.contacts.iter().find(|c| c.id == id).cloned())
    }

    async fn delete_contact(&self, id: i64) -> RepoResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.contacts.len();
        t.contacts.retain(|c| c.id != id);
        Ok(t.contacts.len() != before)
    }
}

// --- Test State ---

/// The application state plus typed handles on its test doubles.
pub struct TestContext {
    pub state: AppState,
    pub repo: Arc<InMemoryRepository>,
    pub storage: MockStorageService,
    pub mailer: MockMailer,
    pub revocations: Arc<InMemoryRevocationStore>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(MockStorageService::new(), MockMailer::new(), AppConfig::default())
    }

    pub fn build(storage: MockStorageService, mailer: MockMailer, config: AppConfig) -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        let revocations = Arc::new(InMemoryRevocationStore::new());
        let state = AppState {
            repo: repo.clone() as RepositoryState,
            storage: Arc::new(storage.clone()) as StorageState,
            mailer: Arc::new(mailer.clone()) as MailerState,
            revocations: revocations.clone() as RevocationState,
            config,
        };
        Self {
            state,
            repo,
            storage,
            mailer,
            revocations,
        }
    }

    pub async fn seed_user(&self, username: &str, email: &str, password: &str) -> User {
        self.repo
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: auth::hash_password(password).unwrap(),
                profile_image: None,
            })
            .await
            .unwrap()
    }

    pub async fn seed_admin(&self, username: &str, email: &str, password: &str) -> Admin {
        self.repo
            .create_admin(NewAdmin {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: auth::hash_password(password).unwrap(),
                role: auth::ADMIN_ROLE.to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn seed_artwork(&self, name: &str, style: &str, owner: Option<i64>) -> Artwork {
        self.repo
            .create_artwork(NewArtwork {
                name: name.to_string(),
                email: "artist@example.com".to_string(),
                style: style.to_string(),
                image_url: format!("http://localhost:9000/mock-bucket/artworks/{}.png", name),
                description: String::new(),
                user_id: owner,
            })
            .await
            .unwrap()
    }

    pub fn token(&self, id: i64, role: Role) -> String {
        auth::issue_token(
            id,
            role,
            &self.state.config.jwt_secret,
            self.state.config.token_ttl_secs,
        )
        .unwrap()
    }
}

pub fn member(id: i64) -> AuthUser {
    AuthUser {
        id,
        role: Role::User,
        jti: format!("test-member-{}", id),
        expires_at: Utc::now() + chrono::Duration::hours(1),
    }
}

pub fn admin(id: i64) -> AuthUser {
    AuthUser {
        id,
        role: Role::Admin,
        jti: format!("test-admin-{}", id),
        expires_at: Utc::now() + chrono::Duration::hours(1),
    }
}

// --- Multipart Bodies ---

const BOUNDARY: &str = "gallery-test-boundary";

/// Builds a `multipart/form-data` body by hand.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }

    /// The body as an extracted `Multipart`, for calling handlers directly.
    pub async fn into_multipart(self) -> Multipart {
        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, Self::content_type())
            .body(Body::from(self.finish()))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }
}
