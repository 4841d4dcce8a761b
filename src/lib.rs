//! # Vignan Local Core
//!
//! Local data-access layer for the Vignan learning hub front end. It stands
//! in for a remote API: a schema-less entity store (courses, assignments,
//! submissions, badges, remarks, ...) with filtering and sorting, and a
//! session service for sign-up, sign-in and profile updates. Everything is
//! persisted in an LMDB key-value substrate, so data survives restarts.
//!
//! ## Layers
//!
//! - [`substrate`] / [`lmdb_store`] - string-keyed persistent storage
//! - [`store`] - shared handle with per-key write serialization
//! - [`collection`] / [`query`] - CRUD and query engine per entity type
//! - [`auth`] - registered users, demo accounts and the current session
//! - [`client`] - the [`VignanClient`](client::VignanClient) facade
//!
//! ## Quick Start
//!
//! ```no_run
//! use vignan_local_core::client::VignanClient;
//! use vignan_local_core::config::StoreConfig;
//! use serde_json::json;
//!
//! let client = VignanClient::open("vignan_hub", StoreConfig::default())?;
//! client.auth().login("student@vignanhub.com", "any")?;
//!
//! let courses = client.entities("Course").list(Some("title"), None)?;
//! let fields = json!({"course_id": courses[0]["id"], "status": "submitted"});
//! client
//!     .entities("Submission")
//!     .create(fields.as_object().cloned().unwrap_or_default())?;
//! # Ok::<(), vignan_local_core::error::StoreError>(())
//! ```
//!
//! ## FFI Functions
//!
//! Every function except [`create_client`] returns a JSON [`AppResponse`]
//! string that the caller releases with [`free_response`].
//!
//! - [`create_client`] / [`close_client`] - handle lifecycle
//! - [`entity_list`], [`entity_filter`], [`entity_get`], [`entity_create`],
//!   [`entity_bulk_create`], [`entity_update`], [`entity_delete`]
//! - [`auth_is_authenticated`], [`auth_me`], [`auth_login`], [`auth_signup`],
//!   [`auth_reset_password`], [`auth_logout`], [`auth_update_me`],
//!   [`auth_redirect_to_login`]

pub mod app_response;
pub mod auth;
pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod lmdb_store;
pub mod query;
pub mod record;
pub mod seed;
pub mod store;
pub mod substrate;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::Serialize;
use serde_json::json;

use crate::app_response::AppResponse;
use crate::auth::AccountType;
use crate::client::VignanClient;
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::record::{into_record, Record};

/// Unwraps an FFI argument helper, returning its error response early.
macro_rules! try_ffi {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(error_ptr) => return error_ptr,
        }
    };
}

/// Opens a client.
///
/// `path` names the database; the files live in a `{path}.lmdb` directory.
/// A null `path` opens an in-memory substrate instead. `config_json` is an
/// optional JSON [`StoreConfig`]; null means defaults.
///
/// # Returns
///
/// A pointer to the client, or null on failure. Release it with
/// [`close_client`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use vignan_local_core::create_client;
///
/// let name = CString::new("vignan_hub").unwrap();
/// let client = create_client(name.as_ptr(), std::ptr::null());
/// assert!(!client.is_null());
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_client(path: *const c_char, config_json: *const c_char) -> *mut VignanClient {
    let config = match optional_c_str(config_json) {
        Ok(Some(json)) => match StoreConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid client configuration: {e}");
                return std::ptr::null_mut();
            }
        },
        Ok(None) => StoreConfig::default(),
        Err(e) => {
            warn!("Invalid UTF-8 in configuration: {e}");
            return std::ptr::null_mut();
        }
    };

    let client = match optional_c_str(path) {
        Ok(Some(path)) => VignanClient::open(path, config),
        Ok(None) => {
            info!("No path given; opening in-memory client");
            VignanClient::in_memory(config)
        }
        Err(e) => {
            warn!("Invalid UTF-8 in path parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    match client {
        Ok(client) => {
            info!("✅ Client initialized successfully");
            Box::into_raw(Box::new(client))
        }
        Err(e) => {
            warn!("❌ Failed to initialize client: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Flushes and frees a client created by [`create_client`]. The pointer must
/// not be used afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_client(client: *mut VignanClient) -> *const c_char {
    if client.is_null() {
        let error = AppResponse::BadRequest("Null client pointer passed to close_client".to_string());
        return response_to_c_string(&error);
    }

    let client = unsafe { Box::from_raw(client) };
    match client.flush() {
        Ok(()) => response_to_c_string(&AppResponse::success("Client closed successfully")),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Releases a response string returned by any other function.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(response: *const c_char) {
    if response.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(response as *mut c_char) });
}

/// Lists every record of `entity`.
///
/// `sort` is `field` or `-field` (null for insertion order); a negative
/// `limit` means no limit. The `Ok` payload is a JSON array.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn entity_list(
    client: *mut VignanClient,
    entity: *const c_char,
    sort: *const c_char,
    limit: i64,
) -> *const c_char {
    let client = try_ffi!(client_ref(client, "entity_list"));
    let entity = try_ffi!(entity_name(entity));
    let sort = try_ffi!(optional_arg(sort, "sort"));

    respond(client.entities(&entity).list(sort.as_deref(), limit_arg(limit)))
}

/// Lists records of `entity` matching every field of the JSON object
/// `predicate_json`. Sorting and limiting as in [`entity_list`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn entity_filter(
    client: *mut VignanClient,
    entity: *const c_char,
    predicate_json: *const c_char,
    sort: *const c_char,
    limit: i64,
) -> *const c_char {
    let client = try_ffi!(client_ref(client, "entity_filter"));
    let entity = try_ffi!(entity_name(entity));
    let predicate = try_ffi!(record_arg(predicate_json, "predicate"));
    let sort = try_ffi!(optional_arg(sort, "sort"));

    respond(
        client
            .entities(&entity)
            .filter(&predicate, sort.as_deref(), limit_arg(limit)),
    )
}

/// Fetches one record. Responds `NotFound` when no record has `id`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn entity_get(client: *mut VignanClient, entity: *const c_char, id: *const c_char) -> *const c_char {
    let client = try_ffi!(client_ref(client, "entity_get"));
    let entity = try_ffi!(entity_name(entity));
    let id = try_ffi!(c_ptr_to_string(id, "id"));

    match client.entities(&entity).get(&id) {
        Ok(Some(record)) => response_to_c_string(&AppResponse::json(&record)),
        Ok(None) => {
            let not_found = AppResponse::NotFound(format!("No {entity} record with id: {id}"));
            response_to_c_string(&not_found)
        }
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Creates a record from a JSON object. The store assigns `id` and
/// `created_date`; the `Ok` payload is the stored record.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn entity_create(client: *mut VignanClient, entity: *const c_char, json_ptr: *const c_char) -> *const c_char {
    let client = try_ffi!(client_ref(client, "entity_create"));
    let entity = try_ffi!(entity_name(entity));
    let fields = try_ffi!(record_arg(json_ptr, "JSON"));

    respond(client.entities(&entity).create(fields))
}

/// Creates every object of a JSON array in one write.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn entity_bulk_create(
    client: *mut VignanClient,
    entity: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let client = try_ffi!(client_ref(client, "entity_bulk_create"));
    let entity = try_ffi!(entity_name(entity));
    let json_str = try_ffi!(c_ptr_to_string(json_ptr, "JSON"));

    let items: Vec<Record> = match serde_json::from_str(&json_str) {
        Ok(items) => items,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Expected an array of objects: {e}"));
            return response_to_c_string(&error);
        }
    };

    respond(client.entities(&entity).bulk_create(items))
}

/// Shallow-merges a JSON object into the record with `id`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn entity_update(
    client: *mut VignanClient,
    entity: *const c_char,
    id: *const c_char,
    json_ptr: *const c_char,
) -> *const c_char {
    let client = try_ffi!(client_ref(client, "entity_update"));
    let entity = try_ffi!(entity_name(entity));
    let id = try_ffi!(c_ptr_to_string(id, "id"));
    let patch = try_ffi!(record_arg(json_ptr, "JSON"));

    respond(client.entities(&entity).update(&id, &patch))
}

/// Deletes the record with `id`. Succeeds whether or not it existed; the
/// payload's `deleted` flag says which.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn entity_delete(client: *mut VignanClient, entity: *const c_char, id: *const c_char) -> *const c_char {
    let client = try_ffi!(client_ref(client, "entity_delete"));
    let entity = try_ffi!(entity_name(entity));
    let id = try_ffi!(c_ptr_to_string(id, "id"));

    respond(
        client
            .entities(&entity)
            .delete(&id)
            .map(|deleted| json!({"success": true, "deleted": deleted})),
    )
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_is_authenticated(client: *mut VignanClient) -> *const c_char {
    let client = try_ffi!(client_ref(client, "auth_is_authenticated"));
    respond(client.auth().is_authenticated())
}

/// The signed-in user, or JSON `null` when anonymous.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_me(client: *mut VignanClient) -> *const c_char {
    let client = try_ffi!(client_ref(client, "auth_me"));
    respond(client.auth().me())
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_login(client: *mut VignanClient, email: *const c_char, password: *const c_char) -> *const c_char {
    let client = try_ffi!(client_ref(client, "auth_login"));
    let email = try_ffi!(c_ptr_to_string(email, "email"));
    let password = try_ffi!(c_ptr_to_string(password, "password"));

    respond(client.auth().login(&email, &password))
}

/// Registers and signs in. `account_type` is `student` or `teacher`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_signup(
    client: *mut VignanClient,
    email: *const c_char,
    password: *const c_char,
    full_name: *const c_char,
    account_type: *const c_char,
) -> *const c_char {
    let client = try_ffi!(client_ref(client, "auth_signup"));
    let email = try_ffi!(c_ptr_to_string(email, "email"));
    let password = try_ffi!(c_ptr_to_string(password, "password"));
    let full_name = try_ffi!(c_ptr_to_string(full_name, "full_name"));
    let account_type = try_ffi!(c_ptr_to_string(account_type, "account_type"));

    let account_type: AccountType = match account_type.parse() {
        Ok(kind) => kind,
        Err(e) => return response_to_c_string(&AppResponse::from(e)),
    };

    respond(client.auth().signup(&email, &password, &full_name, account_type))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_reset_password(
    client: *mut VignanClient,
    email: *const c_char,
    new_password: *const c_char,
) -> *const c_char {
    let client = try_ffi!(client_ref(client, "auth_reset_password"));
    let email = try_ffi!(c_ptr_to_string(email, "email"));
    let new_password = try_ffi!(c_ptr_to_string(new_password, "new_password"));

    respond(
        client
            .auth()
            .reset_password(&email, &new_password)
            .map(|()| json!({"success": true})),
    )
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_logout(client: *mut VignanClient) -> *const c_char {
    let client = try_ffi!(client_ref(client, "auth_logout"));
    respond(client.auth().logout().map(|()| json!({"success": true})))
}

/// Merges a JSON object into the signed-in user's profile.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_update_me(client: *mut VignanClient, json_ptr: *const c_char) -> *const c_char {
    let client = try_ffi!(client_ref(client, "auth_update_me"));
    let patch = try_ffi!(record_arg(json_ptr, "JSON"));

    respond(client.auth().update_me(&patch))
}

/// Navigation hint for the sign-in page. `return_to` may be null.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn auth_redirect_to_login(client: *mut VignanClient, return_to: *const c_char) -> *const c_char {
    let client = try_ffi!(client_ref(client, "auth_redirect_to_login"));
    let return_to = try_ffi!(optional_arg(return_to, "return_to"));

    response_to_c_string(&AppResponse::json(&client.auth().redirect_to_login(return_to.as_deref())))
}

fn respond<T: Serialize>(result: StoreResult<T>) -> *const c_char {
    match result {
        Ok(value) => response_to_c_string(&AppResponse::json(&value)),
        Err(e) => {
            warn!("Operation failed: {e}");
            response_to_c_string(&AppResponse::from(e))
        }
    }
}

fn limit_arg(limit: i64) -> Option<usize> {
    usize::try_from(limit).ok()
}

fn client_ref<'a>(client: *mut VignanClient, function: &str) -> Result<&'a VignanClient, *const c_char> {
    match unsafe { client.as_ref() } {
        Some(client) => Ok(client),
        None => {
            let error = AppResponse::BadRequest(format!("Null client pointer passed to {function}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn entity_name(ptr: *const c_char) -> Result<String, *const c_char> {
    let name = c_ptr_to_string(ptr, "entity")?;
    if name.trim().is_empty() {
        let error = AppResponse::BadRequest("Entity name must not be empty".to_string());
        return Err(response_to_c_string(&error));
    }
    Ok(name)
}

fn record_arg(ptr: *const c_char, field_name: &str) -> Result<Record, *const c_char> {
    let json_str = c_ptr_to_string(ptr, field_name)?;
    let value: serde_json::Value = match serde_json::from_str(&json_str) {
        Ok(value) => value,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid {field_name}: {e}"));
            return Err(response_to_c_string(&error));
        }
    };
    into_record(value).map_err(|e| response_to_c_string(&AppResponse::from(e)))
}

fn optional_arg(ptr: *const c_char, field_name: &str) -> Result<Option<String>, *const c_char> {
    optional_c_str(ptr).map_err(|e| {
        let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
        response_to_c_string(&error)
    })
}

fn optional_c_str(ptr: *const c_char) -> Result<Option<String>, std::str::Utf8Error> {
    if ptr.is_null() {
        return Ok(None);
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map(|s| Some(s.to_string()))
}

/// Serializes `response` into a heap C string owned by the caller.
///
/// Returns null if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a required C string argument, producing a `BadRequest` response
/// for null pointers and invalid UTF-8.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
