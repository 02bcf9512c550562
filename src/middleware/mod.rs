/*
 * Responsibility
 * - Public interface of the middlewares (extauth, http)
 */
pub mod extauth;
pub mod http;
